mod logging;
mod render;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use polysql::{DbConfig, Dialect, Flavor};
use tracing::debug;

use render::{RenderArgs, Rendered};

#[derive(Parser, Debug)]
#[command(name = "polysql")]
#[command(about = "Render dialect-specific SQL statements and connection URLs")]
#[command(version)]
pub struct Args {
    /// SQL dialect: postgres, mariadb, mysql or sqlite3
    #[arg(short, long, global = true, conflicts_with = "url")]
    dialect: Option<String>,

    /// Infer the dialect from a connection URL (e.g., postgres://localhost/app)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Quote identifiers with the dialect's quote character
    #[arg(long, global = true)]
    quoted: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a statement and its bound arguments
    Render(RenderArgs),
    /// Resolve connection defaults and print the connection URL
    Dsn(DsnArgs),
}

#[derive(clap::Args, Debug)]
struct DsnArgs {
    #[arg(long, default_value = "localhost")]
    host: String,

    /// 0 leaves the port out of the URL
    #[arg(long, default_value_t = 0)]
    port: u16,

    #[arg(long, default_value = "")]
    user: String,

    #[arg(long, default_value = "")]
    password: String,

    /// Database name, or the file path for SQLite
    #[arg(long)]
    database: String,

    /// Postgres only (defaults to disable)
    #[arg(long)]
    ssl_mode: Option<String>,

    #[arg(long)]
    max_open: Option<u32>,

    #[arg(long)]
    max_idle: Option<u32>,

    #[arg(long)]
    max_lifetime_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn resolve_dialect(args: &Args) -> Result<Dialect> {
    match (&args.dialect, &args.url) {
        (Some(name), _) => name.parse::<Dialect>().context("Failed to parse --dialect"),
        (None, Some(url)) => Dialect::from_url(url).context("Failed to infer dialect from --url"),
        (None, None) => bail!("Either --dialect or --url is required"),
    }
}

fn print_statement(format: Format, rendered: &Rendered) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(rendered)?),
        Format::Text => {
            println!("📝 SQL: {}", rendered.sql);
            println!("📦 Args: {}", serde_json::to_string(&rendered.args)?);
        }
    }
    Ok(())
}

fn print_dsn(format: Format, dialect: Dialect, dsn: &DsnArgs) -> Result<()> {
    let config = DbConfig {
        user_name: dsn.user.clone(),
        password: dsn.password.clone(),
        host: dsn.host.clone(),
        port: dsn.port,
        database: dsn.database.clone(),
        ssl_mode: dsn.ssl_mode.clone(),
        max_lifetime_secs: dsn.max_lifetime_secs,
        max_idle_conns: dsn.max_idle,
        max_open_conns: dsn.max_open,
    };
    let settings = config.resolve(dialect);
    let url = settings.url();

    match format {
        Format::Json => {
            let output = serde_json::json!({ "url": url, "settings": settings });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Format::Text => {
            println!("🔌 URL: {}", url);
            println!(
                "⚙️  Pool: max_open={}, max_idle={}, max_lifetime={}s",
                settings.max_open_conns, settings.max_idle_conns, settings.max_lifetime_secs
            );
            if let Some(ssl_mode) = &settings.ssl_mode {
                println!("🔒 SSL mode: {}", ssl_mode);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_logging(&args)?;

    let dialect = resolve_dialect(&args)?;
    let flavor = if args.quoted {
        Flavor::quoted(dialect)
    } else {
        Flavor::from(dialect)
    };
    debug!(%dialect, quoted = args.quoted, "resolved flavor");

    match &args.command {
        Command::Render(render_args) => {
            let rendered = render::render(flavor, render_args)?;
            print_statement(args.format, &rendered)
        }
        Command::Dsn(dsn_args) => print_dsn(args.format, dialect, dsn_args),
    }
}
