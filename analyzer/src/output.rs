// output.rs — Rendering findings and diagnostics
//
// Text rendering resolves byte offsets to 1-based line:column positions;
// JSON rendering is for tool integration and carries the baseline
// fingerprint of every finding. Both are deterministic for identical input.
//
// Preconditions: spans point into the given source text.
// Postconditions: returns complete output strings ending in a newline
//                 (empty input renders text as an empty string).
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::fmt::Write;

use serde::Serialize;

use crate::baseline;
use crate::diag::{DiagLevel, Diagnostic};
use crate::scan::Finding;

// ── Line index ──────────────────────────────────────────────────────────────

/// Maps byte offsets to 1-based line and column numbers.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// 1-based (line, column) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&s| s <= offset) - 1;
        (line + 1, offset - self.line_starts[line] + 1)
    }
}

// ── Text rendering ──────────────────────────────────────────────────────────

/// Render one diagnostic as a text block:
/// severity line, location line, related notes, optional hint.
pub fn render_diagnostic(diag: &Diagnostic, index: &LineIndex, file: &str) -> String {
    let level = match diag.level {
        DiagLevel::Error => "error",
        DiagLevel::Warning => "warning",
    };
    let mut out = String::new();
    match diag.code {
        Some(code) => {
            let _ = writeln!(out, "{}[{}]: {}", level, code, diag.message);
        }
        None => {
            let _ = writeln!(out, "{}: {}", level, diag.message);
        }
    }
    let (line, col) = index.line_col(diag.span.start);
    let _ = writeln!(out, "  --> {}:{}:{}", file, line, col);
    for related in &diag.related_spans {
        let (line, col) = index.line_col(related.span.start);
        let _ = writeln!(out, "  note: {} ({}:{}:{})", related.label, file, line, col);
    }
    if let Some(hint) = &diag.hint {
        let _ = writeln!(out, "  hint: {}", hint);
    }
    out
}

/// Render findings as text blocks separated by blank lines.
pub fn render_text(findings: &[Finding], source: &str, file: &str) -> String {
    let index = LineIndex::new(source);
    let blocks: Vec<String> = findings
        .iter()
        .map(|f| render_diagnostic(&f.to_diagnostic(), &index, file))
        .collect();
    blocks.join("\n")
}

// ── JSON rendering ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonSpan {
    start: usize,
    end: usize,
}

#[derive(Serialize)]
struct JsonFinding {
    code: &'static str,
    message: String,
    file: String,
    line: usize,
    column: usize,
    span: JsonSpan,
    callee: String,
    argument: String,
    ordinal: usize,
    fingerprint: String,
}

#[derive(Serialize)]
struct JsonReport {
    version: u32,
    findings: Vec<JsonFinding>,
}

/// Render findings as a pretty-printed JSON report.
pub fn render_json(findings: &[Finding], source: &str, file: &str) -> String {
    let index = LineIndex::new(source);
    let report = JsonReport {
        version: 1,
        findings: findings
            .iter()
            .map(|f| {
                let (line, column) = index.line_col(f.span.start);
                JsonFinding {
                    code: crate::diag::codes::W0100.0,
                    message: f.to_diagnostic().message,
                    file: file.to_string(),
                    line,
                    column,
                    span: JsonSpan {
                        start: f.span.start,
                        end: f.span.end,
                    },
                    callee: f.callee.clone(),
                    argument: f.argument.clone(),
                    ordinal: f.ordinal,
                    fingerprint: baseline::fingerprint(f),
                }
            })
            .collect(),
    };
    let mut text = serde_json::to_string_pretty(&report)
        .expect("report serialization cannot fail");
    text.push('\n');
    text
}

// ── Tests ───────────────────────────────────────────────────────────────────
