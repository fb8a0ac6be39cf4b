use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use nicval::{Scenario, SessionError, ValidationReport};

const EXIT_MISMATCH: u8 = 1;
const EXIT_SETUP: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "nicval-check",
    about = "Check NIC RSS queue placement and ring pointer wraparound against before/after dumps."
)]
struct Args {
    /// Scenario JSON describing the traffic burst and the dumps taken around it
    scenario: PathBuf,

    /// Directory that relative dump paths are resolved against (defaults to the scenario's directory)
    #[arg(long, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pretty: bool,
}

fn main() -> ExitCode {
    // stdout carries the report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_MISMATCH),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_SETUP)
        }
    }
}

/// Returns whether the device behaved as predicted.
fn run(args: Args) -> anyhow::Result<bool> {
    let text = fs::read_to_string(&args.scenario)
        .with_context(|| format!("read scenario {}", args.scenario.display()))?;
    let scenario = Scenario::from_json(&text)
        .with_context(|| format!("parse scenario {}", args.scenario.display()))?;

    let base_dir = match args.base_dir {
        Some(dir) => dir,
        None => args
            .scenario
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let report = scenario
        .run(|name| load(&base_dir, name))
        .with_context(|| format!("run scenario {}", args.scenario.display()))?;

    print_report(&report, args.pretty)?;
    if report.passed() {
        tracing::info!("device matches prediction");
    } else {
        tracing::error!(
            queue_violations = report.verdict.violations.len(),
            ring_failures = report.rings.as_ref().map_or(0, |r| r.failures.len()),
            "device does not match prediction"
        );
    }
    Ok(report.passed())
}

fn load(base_dir: &Path, name: &str) -> Result<String, SessionError> {
    let path = base_dir.join(name);
    tracing::debug!(path = %path.display(), "reading dump");
    fs::read_to_string(&path).map_err(|source| SessionError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn print_report(report: &ValidationReport, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
    .context("serialize report")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("write report")?;
    Ok(())
}
