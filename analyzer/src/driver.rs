// driver.rs — Analysis orchestration
//
// Runs the phases for one source text: parse → bind → scan. Accumulates
// parse and bind diagnostics, always runs the scan on whatever parsed
// (rules run on erroneous programs, the way host analyzers do), and
// reports per-phase timing when verbose.
//
// Preconditions: none.
// Postconditions: returns all diagnostics plus the findings in
//                 deterministic source order.
// Failure modes: none; failures surface as diagnostics.
// Side effects: verbose timing lines on stderr.

use std::time::Instant;

use crate::cancel::CancelFlag;
use crate::diag::{DiagLevel, Diagnostic};
use crate::scan::{self, Finding};

/// Options for one analysis run.
#[derive(Debug, Default, Clone)]
pub struct CheckOptions {
    /// Print phase timing to stderr.
    pub verbose: bool,
}

/// Result of one analysis run.
#[derive(Debug)]
pub struct CheckResult {
    /// Parse and bind diagnostics, in phase order.
    pub diagnostics: Vec<Diagnostic>,
    /// Rule findings in source order.
    pub findings: Vec<Finding>,
}

impl CheckResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagLevel::Error)
    }
}

/// Run parse → bind → scan over one source text.
pub fn check_source(source: &str, options: &CheckOptions) -> CheckResult {
    check_source_with(source, options, &CancelFlag::new())
}

/// As `check_source`, with a caller-supplied cancellation flag.
pub fn check_source_with(
    source: &str,
    options: &CheckOptions,
    cancel: &CancelFlag,
) -> CheckResult {
    let t = Instant::now();
    let parse_result = crate::parser::parse(source);
    phase_done(options, "parse", t);

    let mut diagnostics: Vec<Diagnostic> = parse_result
        .errors
        .iter()
        .map(|e| {
            Diagnostic::new(DiagLevel::Error, *e.span(), format!("parse error: {}", e))
        })
        .collect();

    let Some(program) = parse_result.program else {
        return CheckResult {
            diagnostics,
            findings: Vec::new(),
        };
    };

    let t = Instant::now();
    let bind_result = crate::bind::bind(&program);
    phase_done(options, "bind", t);
    diagnostics.extend(bind_result.diagnostics);

    let t = Instant::now();
    let findings = scan::scan_program(&program, &bind_result.model, cancel);
    phase_done(options, "scan", t);

    CheckResult {
        diagnostics,
        findings,
    }
}

fn phase_done(options: &CheckOptions, name: &str, started: Instant) {
    if options.verbose {
        eprintln!(
            "adrift: {} complete, {:.1}ms",
            name,
            started.elapsed().as_secs_f64() * 1000.0
        );
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
