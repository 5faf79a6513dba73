mod commands;
mod logging;
mod render;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use gphotos_core::date_range::parse_date;
use gphotos_core::{Identity, SyncError};
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "gphotos")]
#[command(version, about = "Download Google Photos media into a local <year>/<month> folder tree")]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download media created between two dates that is not yet present locally
    Get {
        /// Folder receiving the <year>/<month> tree
        destination: PathBuf,

        /// First date to check (YYYY/MM/DD, defaults to today)
        #[arg(short, long, value_parser = parse_cli_date)]
        from: Option<NaiveDate>,

        /// Last date to check, inclusive (YYYY/MM/DD, defaults to today)
        #[arg(short, long, value_parser = parse_cli_date)]
        to: Option<NaiveDate>,

        /// Only report what would be downloaded
        #[arg(long)]
        dry_run: bool,

        /// How remote items are matched against local files
        #[arg(long = "match", value_enum, default_value_t = MatchMode::Filename)]
        match_mode: MatchMode,

        /// Only scan <destination>/<year> folders for the years in the range
        #[arg(long)]
        range_years_only: bool,
    },
    /// Authorize access to Google Photos and cache the token
    Auth,
}

#[derive(Clone, Copy, ValueEnum)]
enum MatchMode {
    /// Same file name anywhere under the destination
    Filename,
    /// Same file name in the same <year>/<month> folder
    Dated,
}

impl From<MatchMode> for Identity {
    fn from(mode: MatchMode) -> Self {
        match mode {
            MatchMode::Filename => Identity::Filename,
            MatchMode::Dated => Identity::Dated,
        }
    }
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = tokio::select! {
        result = run(cli) => result,
        () = interrupted(tokio::signal::ctrl_c()) => {
            eprintln!("\nProcess stopped by the user");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("{e:#}").red());
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Resolves once `signal` fires. If the handler cannot be installed the
/// run continues without Ctrl-C handling.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Get {
            destination,
            from,
            to,
            dry_run,
            match_mode,
            range_years_only,
        } => {
            let options = commands::get::GetOptions {
                destination,
                from,
                to,
                dry_run,
                identity: match_mode.into(),
                range_years_only,
            };
            commands::get::run(options).await
        }
        Commands::Auth => commands::auth::run().await,
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<SyncError>()
        .map(|e| e.exit_code())
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}
