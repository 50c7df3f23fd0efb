//! CLI binary for carscan.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, shows a spinner while the model call is in flight, and
//! prints the report JSON.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use carscan::{analyze_file, analyze_to_file, AnalysisConfig, NormalizationOutcome};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a PDF inspection report (stdout)
  carscan inspection.pdf

  # Analyze a phone photo and save the report
  carscan photo.jpg -o output/car_condition_report.json

  # Use a specific model
  carscan --model gpt-4o inspection.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY   API key for the model service (required)
  CARSCAN_MODEL    Override the model ID

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Analyze:       carscan inspection.pdf
"#;

/// Analyze a vehicle-inspection document into a structured condition report.
#[derive(Parser, Debug)]
#[command(
    name = "carscan",
    version,
    about = "Analyze vehicle-inspection documents (PDF or image) using LLMs",
    long_about = "Analyze a vehicle-inspection document — a native-text PDF, a scanned PDF, \
or a photo — and print a structured condition report. Scanned documents and images are \
analyzed through the model's vision path automatically.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the inspection document (.pdf, .jpg, .jpeg, .png).
    input: PathBuf,

    /// Write the report JSON to this file as well as stdout.
    #[arg(short, long, env = "CARSCAN_OUTPUT")]
    output: Option<PathBuf>,

    /// Model ID (e.g. gpt-4o).
    #[arg(long, env = "CARSCAN_MODEL")]
    model: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "CARSCAN_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max model output tokens.
    #[arg(long, env = "CARSCAN_MAX_TOKENS", default_value_t = 800)]
    max_tokens: u32,

    /// Retries on transient model-service failure.
    #[arg(long, env = "CARSCAN_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call HTTP timeout in seconds.
    #[arg(long, env = "CARSCAN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the report and errors.
    #[arg(short, long, env = "CARSCAN_QUIET")]
    quiet: bool,

    /// Disable the spinner.
    #[arg(long, env = "CARSCAN_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = AnalysisConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run the analysis ─────────────────────────────────────────────────
    let show_spinner = !cli.quiet && !cli.no_progress && !cli.verbose;
    let spinner = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Analyzing {}…", cli.input.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = match cli.output {
        Some(ref out_path) => analyze_to_file(&cli.input, out_path, &config).await,
        None => analyze_file(&cli.input, &config).await,
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = result.context("Analysis failed")?;

    // ── Print the report ─────────────────────────────────────────────────
    let json = serde_json::to_string_pretty(&output.response())
        .context("Failed to serialize report")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(json.as_bytes()).context("stdout")?;
    handle.write_all(b"\n").ok();

    if !cli.quiet {
        if let NormalizationOutcome::Malformed { ref diagnostic, .. } = output.outcome {
            eprintln!("warning: model reply failed validation: {diagnostic}");
        }
        eprintln!(
            "{:?} path, {} retries, model {}ms, total {}ms",
            output.stats.path,
            output.stats.retries,
            output.stats.model_duration_ms,
            output.stats.total_duration_ms,
        );
        if let Some(ref out_path) = cli.output {
            eprintln!("report written to {}", out_path.display());
        }
    }

    Ok(())
}
