use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::Args;

/// Logs go to stderr so rendered statements on stdout stay machine-readable.
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn setup_logging(args: &Args) -> Result<()> {
    let level = if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("polysql={level},polysql_cli={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("Failed to set tracing subscriber: {err}"))
}
