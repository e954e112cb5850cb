// baseline.rs — Finding fingerprints and baseline suppression files
//
// Gives every finding a stable fingerprint derived from its semantic
// identity rather than its source span, so unrelated edits do not
// invalidate it. A baseline file records the fingerprints of known
// findings; later runs suppress anything the baseline contains.
//
// Preconditions: none.
// Postconditions: fingerprints are deterministic for a given finding
//                 identity; baseline files round-trip through JSON.
// Failure modes: I/O and format errors surface as `BaselineError`.
// Side effects: `load`/`save` touch the filesystem.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::diag::codes;
use crate::scan::Finding;

/// Current baseline file schema version.
pub const BASELINE_VERSION: u32 = 1;

// ── Fingerprints ────────────────────────────────────────────────────────────

/// Stable fingerprint of a finding: SHA-256 over the rule code, callee
/// name, argument display name, and argument ordinal. 64 hex characters.
/// Spans are deliberately excluded so whitespace-only edits keep the
/// fingerprint valid.
pub fn fingerprint(finding: &Finding) -> String {
    let mut hasher = Sha256::new();
    hasher.update(codes::W0100.0.as_bytes());
    hasher.update([0]);
    hasher.update(finding.callee.as_bytes());
    hasher.update([0]);
    hasher.update(finding.argument.as_bytes());
    hasher.update([0]);
    hasher.update((finding.ordinal as u64).to_le_bytes());
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    bytes_to_hex(&hash)
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

// ── Baseline files ──────────────────────────────────────────────────────────

/// A set of suppressed finding fingerprints, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Baseline {
    pub version: u32,
    pub fingerprints: BTreeSet<String>,
}

impl Baseline {
    /// Baseline covering the given findings.
    pub fn from_findings(findings: &[Finding]) -> Self {
        Baseline {
            version: BASELINE_VERSION,
            fingerprints: findings.iter().map(fingerprint).collect(),
        }
    }

    /// Whether a finding is suppressed by this baseline.
    pub fn contains(&self, finding: &Finding) -> bool {
        self.fingerprints.contains(&fingerprint(finding))
    }

    /// Drop every finding the baseline suppresses, preserving order.
    pub fn filter(&self, findings: Vec<Finding>) -> Vec<Finding> {
        findings.into_iter().filter(|f| !self.contains(f)).collect()
    }

    /// Load a baseline file.
    pub fn load(path: &Path) -> Result<Baseline, BaselineError> {
        let text = std::fs::read_to_string(path).map_err(|source| BaselineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let baseline: Baseline =
            serde_json::from_str(&text).map_err(|e| BaselineError::Format {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if baseline.version != BASELINE_VERSION {
            return Err(BaselineError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: baseline.version,
            });
        }
        Ok(baseline)
    }

    /// Write the baseline file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        let mut text = serde_json::to_string_pretty(self).map_err(|e| BaselineError::Format {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        text.push('\n');
        std::fs::write(path, text).map_err(|source| BaselineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Errors that can occur while loading or saving baseline files.
#[derive(Debug)]
pub enum BaselineError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Format {
        path: PathBuf,
        message: String,
    },
    UnsupportedVersion {
        path: PathBuf,
        version: u32,
    },
}

impl fmt::Display for BaselineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineError::Io { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            BaselineError::Format { path, message } => {
                write!(f, "{}: invalid baseline: {}", path.display(), message)
            }
            BaselineError::UnsupportedVersion { path, version } => {
                write!(
                    f,
                    "{}: unsupported baseline version {} (expected {})",
                    path.display(),
                    version,
                    BASELINE_VERSION
                )
            }
        }
    }
}

impl std::error::Error for BaselineError {}

// ── Tests ───────────────────────────────────────────────────────────────────
