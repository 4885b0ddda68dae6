#![allow(missing_docs)]
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use route_migration_core::{MigrationConfig, Pipeline, read_route_ids};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: route-migrate [OPTIONS] <ROUTE_IDS_FILE>

Export every route listed in ROUTE_IDS_FILE (one id per line) from the source
ERP system and import it into the target ERP system.

Options:
  --poll-attempts <n>   Maximum number of job status rounds
  --poll-delay-ms <ms>  Base delay between two status rounds
  --timeout-secs <s>    Timeout of every HTTP request
  -h, --help            Print this help

Both systems are configured through SOURCE_* and TARGET_* environment
variables, read from a .env file when present.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(%err, "ignoring unreadable .env file"),
    }

    let args = AppArgs::parse().context("parsing arguments")?;
    if args.help {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }
    let Some(route_ids_file) = args.route_ids_file.clone() else {
        print_usage();
        return Ok(ExitCode::FAILURE);
    };

    let mut config = MigrationConfig::from_env().context("reading configuration")?;
    args.apply(&mut config);

    let route_ids = read_route_ids(&route_ids_file)?;
    info!(file = %route_ids_file.display(), routes = route_ids.len(), "route ids loaded");

    let pipeline = Pipeline::from_config(&config)?;
    let report = match pipeline.run(&route_ids).await {
        Ok(report) => report,
        Err(err) => {
            for failure in err.failures() {
                print_lines(failure);
            }
            return Err(err.into());
        }
    };

    print_lines(&report);
    info!("Bye!");
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::print_stdout)]
fn print_usage() {
    println!("{USAGE}");
}

#[allow(clippy::print_stdout)]
fn print_lines(value: &impl std::fmt::Display) {
    let text = value.to_string();
    for line in text.lines() {
        println!("{line}");
    }
}

#[derive(Debug, Default)]
struct AppArgs {
    help: bool,
    route_ids_file: Option<PathBuf>,
    poll_attempts: Option<usize>,
    poll_delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

impl AppArgs {
    fn parse() -> Result<Self> {
        Self::from_arguments(pico_args::Arguments::from_env())
    }

    fn from_arguments(mut pargs: pico_args::Arguments) -> Result<Self> {
        let help = pargs.contains(["-h", "--help"]);

        let poll_attempts = pargs
            .opt_value_from_str("--poll-attempts")
            .context("parsing poll attempts argument")?;

        let poll_delay_ms = pargs
            .opt_value_from_str("--poll-delay-ms")
            .context("parsing poll delay argument")?;

        let timeout_secs = pargs
            .opt_value_from_str("--timeout-secs")
            .context("parsing timeout argument")?;

        let route_ids_file = pargs
            .opt_free_from_str()
            .context("parsing route ids file argument")?;

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            warn!(?remaining, "Warning: unused arguments left");
        }

        Ok(Self {
            help,
            route_ids_file,
            poll_attempts,
            poll_delay_ms,
            timeout_secs,
        })
    }

    fn apply(&self, config: &mut MigrationConfig) {
        if let Some(max_attempts) = self.poll_attempts {
            config.poller.max_attempts = max_attempts;
        }
        if let Some(delay_ms) = self.poll_delay_ms {
            config.poller.base_delay = Duration::from_millis(delay_ms);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(timeout_secs);
        }
    }
}
