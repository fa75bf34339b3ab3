use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use findmerge::config::ReconcileConfig;
use findmerge::engine::reconcile;
use findmerge::error::ReconcileError;
use findmerge::merge::RedactionHook;
use findmerge::ports::{AutoPort, DecisionPort};
use findmerge::redact::{SubstringScanner, TermTable};
use findmerge::telemetry;

mod console;

/// Reconcile two finding library JSON files into ID-consistent merged
/// outputs.
///
/// Both inputs are JSON arrays of finding objects. Records are matched
/// across the two files by weighted similarity, field conflicts are resolved
/// interactively (or by the deterministic auto-suggestion with
/// --non-interactive), and both outputs are renumbered so matched findings
/// share one ID.
#[derive(Parser)]
#[command(name = "findmerge")]
#[command(version, about)]
struct Cli {
    /// Left input JSON file.
    #[arg(short = 'a', long)]
    left: PathBuf,

    /// Right input JSON file.
    #[arg(short = 'b', long)]
    right: PathBuf,

    /// Output path for the merged left file. Defaults to the input path
    /// with `.merged.json` appended.
    #[arg(long)]
    out_left: Option<PathBuf>,

    /// Output path for the merged right file. Defaults to the input path
    /// with `.merged.json` appended.
    #[arg(long)]
    out_right: Option<PathBuf>,

    /// Configuration file.
    #[arg(long, default_value = "findmerge.toml")]
    config: PathBuf,

    /// Apply auto-suggested values without prompting (best-guess mode).
    #[arg(long)]
    non_interactive: bool,

    /// Enable verbose logging.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.debug);

    let mut config = ReconcileConfig::load(&cli.config).map_err(ReconcileError::from)?;
    if cli.non_interactive {
        config.merge.interactive = false;
    }

    let left_raw = read_findings(&cli.left)?;
    let right_raw = read_findings(&cli.right)?;

    let out_left = cli
        .out_left
        .unwrap_or_else(|| default_output_path(&cli.left));
    let out_right = cli
        .out_right
        .unwrap_or_else(|| default_output_path(&cli.right));

    let terms = match (config.redaction.enabled, &config.redaction.terms_file) {
        (true, Some(path)) => Some(
            TermTable::load(path)
                .with_context(|| format!("loading sensitive terms from '{}'", path.display()))?,
        ),
        _ => None,
    };
    let scanner = SubstringScanner;
    let hook = terms.as_ref().map(|terms| RedactionHook {
        port: &scanner,
        terms,
    });

    let mut port: Box<dyn DecisionPort> = if config.merge.interactive {
        Box::new(console::ConsolePort)
    } else {
        Box::new(AutoPort)
    };

    let output = reconcile(&left_raw, &right_raw, &config, port.as_mut(), hook.as_ref())?;

    write_findings(&out_left, &output.left)?;
    write_findings(&out_right, &output.right)?;

    info!(
        left = %out_left.display(),
        right = %out_right.display(),
        records = output.left.len(),
        matched = output.report.matched,
        "merged files written"
    );
    println!(
        "Reconciled {} finding(s) ({} matched, {} unmatched left, {} unmatched right)",
        output.left.len(),
        output.report.matched,
        output.report.unmatched_left,
        output.report.unmatched_right,
    );
    println!("  left  -> {}", out_left.display());
    println!("  right -> {}", out_right.display());

    Ok(())
}

/// Default output path: the input path with `.merged.json` appended.
fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".merged.json");
    PathBuf::from(name)
}

/// Read one input file as a JSON array of raw finding objects.
fn read_findings(path: &Path) -> Result<Vec<serde_json::Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading input file '{}'", path.display()))?;
    let parsed: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing '{}' as JSON", path.display()))?;

    match parsed {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(ReconcileError::InvalidInput {
            detail: format!(
                "'{}' holds a JSON {} at the top level, expected an array of findings",
                path.display(),
                json_kind(&other)
            ),
        }
        .into()),
    }
}

/// Write one merged collection as pretty-printed JSON.
fn write_findings(path: &Path, findings: &[findmerge::Finding]) -> Result<()> {
    let raw: Vec<serde_json::Value> = findings.iter().map(findmerge::Finding::to_raw).collect();
    let mut contents = serde_json::to_string_pretty(&raw).context("serializing output")?;
    contents.push('\n');
    std::fs::write(path, contents)
        .with_context(|| format!("writing output file '{}'", path.display()))
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
