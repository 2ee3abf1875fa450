//! quire CLI - Main entry point

use clap::{Parser, Subcommand};
use quire::{CancelToken, Method, QuireConfig, Rest, RestRequest, TableService};
use quire_cli::{CliError, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// quire - generic REST-over-SQL tables from the command line
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: quire.toml if present)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the bundled schema
    Init,

    /// Read rows
    Get(TableArgs),

    /// Insert one row from --body
    Post(TableArgs),

    /// Update matching rows with --body
    Patch(TableArgs),

    /// Delete matching rows
    Delete(TableArgs),

    /// Report whether a table exists
    CheckTable {
        name: String,
    },
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    table: String,

    /// Query string, e.g. `select=title&limit=2`
    #[arg(short, long, default_value = "")]
    query: String,

    /// JSON request body
    #[arg(short, long)]
    body: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", output::err_line(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config)?.with_db_override(cli.db);
    let (service, pool) =
        TableService::from_config(&config).map_err(|source| CliError::Store {
            path: config.database.path.display().to_string(),
            source,
        })?;
    let rest = Rest::new(service);
    let cancel = CancelToken::new();

    let response = match cli.command {
        Command::Init => {
            pool.apply_schema().map_err(CliError::from)?;
            println!(
                "{}",
                output::success(&format!(
                    "Applied schema to {}",
                    config.database.path.display()
                ))
            );
            return Ok(());
        }
        Command::Get(args) => rest.handle(request(Method::Get, args)?, &cancel),
        Command::Post(args) => rest.handle(request(Method::Post, args)?, &cancel),
        Command::Patch(args) => rest.handle(request(Method::Patch, args)?, &cancel),
        Command::Delete(args) => rest.handle(request(Method::Delete, args)?, &cancel),
        Command::CheckTable { name } => rest.call_rpc(
            "check_table_exists",
            serde_json::json!({ "table_name": name }),
            &cancel,
        ),
    };

    println!("{}", output::render(&response));
    pool.close();
    if response.is_success() {
        Ok(())
    } else {
        Err(CliError::Status(response.status).into())
    }
}

fn load_config(path: Option<PathBuf>) -> Result<QuireConfig, CliError> {
    match path {
        Some(path) => QuireConfig::load_from(path).map_err(Into::into),
        None => QuireConfig::load().map_err(Into::into),
    }
}

fn request(method: Method, args: TableArgs) -> Result<RestRequest, CliError> {
    let mut request = RestRequest::new(method, args.table).with_query(&args.query);
    if let Some(body) = args.body {
        request = request.with_body(serde_json::from_str(&body).map_err(CliError::Body)?);
    }
    Ok(request)
}
