//! Command-line interface for the github-stats binary.
//!
//! The binary loads the configuration, then runs one collection cycle per
//! line received on standard input, the protocol used by monitoring agents
//! that poll long-running input plugins. Each successful repository report is
//! printed as a JSON line on standard output; logs never go to stdout.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
    process,
    sync::Mutex,
};

use clap::{ArgAction, Parser};
use github_stats::{Collector, Error, RepositoryReport, StatsConfig, load_config};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

/// Command line interface for collecting repository commit statistics.
#[derive(Debug, Parser,)]
#[command(name = "github-stats", version, about = "Collect GitHub commit activity statistics")]
struct Cli
{
    /// Path to the YAML configuration file.
    #[arg(long = "config", value_name = "PATH", env = "GITHUB_STATS_CONFIG")]
    config: PathBuf,

    /// Run a single collection cycle immediately instead of waiting for
    /// triggers on standard input.
    #[arg(long = "once", action = ArgAction::SetTrue)]
    once: bool,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    if let Err(error,) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration, logging setup, and output errors. Repository
/// failures are logged by the collector and never end the process.
async fn run() -> Result<(), Error,>
{
    let cli = Cli::parse();
    let config = load_config(&cli.config,)?;
    init_logging(&config,)?;

    let mut collector = Collector::from_config(&config,)?;
    info!(
        repositories = collector.repository_count(),
        interval = %humantime::format_duration(config.interval),
        "collector ready"
    );

    if cli.once {
        return run_cycle(&mut collector,).await;
    }

    let mut triggers = BufReader::new(tokio::io::stdin(),).lines();
    while triggers.next_line().await.map_err(|source| Error::Stream {
        source,
    },)?
    .is_some()
    {
        run_cycle(&mut collector,).await?;
    }

    info!("trigger input closed, exiting");
    Ok((),)
}

async fn run_cycle<A,>(collector: &mut Collector<A,>,) -> Result<(), Error,>
where
    A: github_stats::HostingApi,
{
    let span = info_span!("collection_cycle", trigger = "stdin");
    let outcome = collector.run_cycle_in(span,).await;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_reports(&mut handle, &outcome.reports,)
}

fn write_reports<W: Write,>(writer: &mut W, reports: &[RepositoryReport],) -> Result<(), Error,>
{
    for report in reports {
        let line = serde_json::to_string(report,).map_err(|source| Error::Serialize {
            source,
        },)?;
        writeln!(writer, "{line}").map_err(|source| Error::Stream {
            source,
        },)?;
    }
    writer.flush().map_err(|source| Error::Stream {
        source,
    },)
}

/// Installs the global subscriber, writing to the configured log file or
/// stderr. `RUST_LOG` overrides the default `info` level.
fn init_logging(config: &StatsConfig,) -> Result<(), Error,>
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),);

    let (writer, ansi,) = match config.log_file.as_deref() {
        Some(path,) => {
            let file = OpenOptions::new()
                .create(true,)
                .append(true,)
                .open(path,)
                .map_err(|source| Error::LogFile {
                    path: path.to_path_buf(),
                    source,
                },)?;
            (BoxMakeWriter::new(Mutex::new(file,),), false,)
        }
        None => (BoxMakeWriter::new(io::stderr,), true,),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter,)
        .with_writer(writer,)
        .with_ansi(ansi,)
        .try_init()
        .map_err(|e| Error::validation(format!("failed to initialize logging: {e}"),),)
}
