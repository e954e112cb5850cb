use clap::Parser;
use std::path::PathBuf;

use adrift::baseline::Baseline;
use adrift::driver::{self, CheckOptions};
use adrift::output::{self, LineIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "adrift",
    version,
    about = "Flags async callbacks passed as fire-and-forget delegate arguments"
)]
struct Cli {
    /// Input .sk sketch file
    source: PathBuf,

    /// Findings output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Baseline file with fingerprints of known findings to suppress
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Write the current findings to the baseline file and exit
    #[arg(long, requires = "baseline")]
    write_baseline: bool,

    /// Print analysis phases and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // ── Read source ──
    let source = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("adrift: error: {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };
    let file_name = cli.source.display().to_string();

    // ── Analyze ──
    let result = driver::check_source(
        &source,
        &CheckOptions {
            verbose: cli.verbose,
        },
    );

    let index = LineIndex::new(&source);
    for diag in &result.diagnostics {
        eprint!("{}", output::render_diagnostic(diag, &index, &file_name));
    }
    if result.has_errors() {
        std::process::exit(1);
    }

    if cli.verbose {
        eprintln!("adrift: {} finding(s)", result.findings.len());
    }

    // ── Baseline handling ──
    if cli.write_baseline {
        let path = cli.baseline.as_ref().expect("clap enforces --baseline");
        let baseline = Baseline::from_findings(&result.findings);
        match baseline.save(path) {
            Ok(()) => {
                eprintln!(
                    "adrift: wrote baseline with {} fingerprint(s) to {}",
                    baseline.fingerprints.len(),
                    path.display()
                );
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("adrift: error: {}", e);
                std::process::exit(2);
            }
        }
    }

    let findings = match &cli.baseline {
        Some(path) => match Baseline::load(path) {
            Ok(baseline) => baseline.filter(result.findings),
            Err(e) => {
                eprintln!("adrift: error: {}", e);
                std::process::exit(2);
            }
        },
        None => result.findings,
    };

    // ── Report ──
    match cli.format {
        OutputFormat::Text => {
            print!("{}", output::render_text(&findings, &source, &file_name));
        }
        OutputFormat::Json => {
            print!("{}", output::render_json(&findings, &source, &file_name));
        }
    }

    if findings.is_empty() {
        std::process::exit(0);
    }
    std::process::exit(1);
}
