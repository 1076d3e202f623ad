//! @ai:module:intent CLI for running request lists through a batch endpoint
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use graph_batch::{
    chunk_requests, create_runner, format_plan, format_record, format_summary, load_requests,
    validate_requests, BatchConfig, BatchRunner, BatchTransport, MockTransport, OutcomeRecord,
    OutputFormat, RequestItem,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "graph-batch")]
#[command(author, version, about = "Run HTTP sub-requests through a $batch endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit requests in batches, retrying throttled items
    Run {
        /// JSON file (or directory of JSON files) with the requests
        #[arg(short, long)]
        input: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        /// Answer every request locally with 200 instead of calling the endpoint
        #[arg(long)]
        dry_run: bool,

        /// Write the full run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Requests per batch (1-20)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Give up on items still throttled after this many retries
        #[arg(long)]
        max_rounds: Option<u32>,
    },

    /// Show how requests would be split into batches
    Plan {
        /// JSON file (or directory of JSON files) with the requests
        #[arg(short, long)]
        input: PathBuf,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Requests per batch (1-20); defaults to the configured batch size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Write the default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "graph-batch.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

struct RunArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    dry_run: bool,
    report: Option<PathBuf>,
    batch_size: Option<usize>,
    max_rounds: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("graph_batch=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            config,
            format,
            dry_run,
            report,
            batch_size,
            max_rounds,
        } => {
            run_batches(RunArgs {
                input,
                config,
                format: format.into(),
                dry_run,
                report,
                batch_size,
                max_rounds,
            })
            .await
        }
        Commands::Plan {
            input,
            config,
            batch_size,
            format,
        } => plan(&input, config.as_deref(), batch_size, format.into()),
        Commands::Init { output } => init_config(&output),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// @ai:intent Load config and requests, then run them against the endpoint or a dry-run echo
/// @ai:effects network, fs:read, fs:write
async fn run_batches(args: RunArgs) -> Result<ExitCode> {
    let config = effective_config(args.config.as_deref(), args.batch_size, args.max_rounds)?;

    let requests = load_requests(&args.input)
        .with_context(|| format!("Failed to load requests from {}", args.input.display()))?;

    tracing::info!("Loaded {} requests", requests.len());

    if args.dry_run {
        let runner = BatchRunner::new(Arc::new(MockTransport::echo()), config.run.clone());
        execute(&runner, &requests, args.format, args.report.as_deref()).await
    } else {
        let runner = create_runner(&config).context("Failed to create batch client")?;
        execute(&runner, &requests, args.format, args.report.as_deref()).await
    }
}

/// @ai:intent Stream outcomes to stdout and summarise
/// @ai:post exit code 0 when everything succeeded, 1 when any failure was reported
/// @ai:effects network, fs:write
async fn execute<T: BatchTransport>(
    runner: &BatchRunner<T>,
    requests: &[RequestItem],
    format: OutputFormat,
    report_path: Option<&Path>,
) -> Result<ExitCode> {
    let report = runner
        .run_each(requests, |outcome| {
            println!("{}", format_record(&OutcomeRecord::from(outcome), format));
        })
        .await?;

    match format {
        OutputFormat::Text => println!("{}", format_summary(&report.stats, format)),
        // keep stdout parseable as JSON lines
        _ => eprintln!("{}", format_summary(&report.stats, format)),
    }

    if let Some(path) = report_path {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(if report.has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// @ai:intent Print the batch layout for an input file
/// @ai:effects fs:read
fn plan(
    input: &Path,
    config: Option<&Path>,
    batch_size: Option<usize>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = effective_config(config, batch_size, None)?;

    let requests = load_requests(input)
        .with_context(|| format!("Failed to load requests from {}", input.display()))?;
    validate_requests(&requests)?;

    let chunks = chunk_requests(&requests, config.run.batch_size);
    println!("{}", format_plan(&chunks, format));
    Ok(ExitCode::SUCCESS)
}

/// @ai:intent Write the default configuration file
/// @ai:effects fs:write
fn init_config(output: &Path) -> Result<ExitCode> {
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }

    BatchConfig::default().save(output)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn load_or_default_config(path: Option<&Path>) -> Result<BatchConfig> {
    match path {
        Some(path) => BatchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(BatchConfig::default()),
    }
}

/// @ai:intent Config file (or defaults) with command-line overrides applied
/// @ai:effects fs:read
fn effective_config(
    path: Option<&Path>,
    batch_size: Option<usize>,
    max_rounds: Option<u32>,
) -> Result<BatchConfig> {
    let mut config = load_or_default_config(path)?;

    if let Some(batch_size) = batch_size {
        config.run.batch_size = batch_size;
    }
    if max_rounds.is_some() {
        config.run.max_throttle_rounds = max_rounds;
    }
    config.validate()?;

    Ok(config)
}
