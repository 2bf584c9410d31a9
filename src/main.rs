use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod activity;
mod config;
mod errors;
mod list;
mod restore;
mod shared;
mod utils;
mod wait;

use crate::errors::{PlatformCliError, Result};

#[derive(Parser)]
#[command(name = "platform-restore")]
#[command(about = "Restore environment backups on the hosted platform", long_about = None)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    /// Answer yes to all confirmation questions
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TargetArgs {
    /// Project ID (default: PLATFORM_PROJECT)
    #[arg(short, long, global = true)]
    project: Option<String>,
    /// Environment ID (default: PLATFORM_ENVIRONMENT)
    #[arg(short, long, global = true)]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore an environment backup
    Restore {
        /// The name of the backup. Defaults to the most recent one
        backup: Option<String>,
        /// Do not wait for the operation to complete
        #[arg(long)]
        no_wait: bool,
    },
    /// List backups of the environment, most recent first
    Backups {
        /// Maximum number of backups to list (0 for all)
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Return data as JSON (for scripting)
        #[arg(short, long)]
        json: bool,
    },
    /// Wait for activities to complete
    Wait {
        /// Activity IDs
        #[arg(required = true)]
        activities: Vec<String>,
    },
    /// Generate sample .env file
    Init,
}

fn init_logging() -> Result<WorkerGuard> {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

    let log_dir = config::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, shared::constants::LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr.and(non_blocking))
        .with_env_filter(env_filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if report_error(&mut std::io::stderr(), &e).is_err() {
                error!(error = %e, "Failed to report error");
            }
            ExitCode::FAILURE
        }
    }
}

/// Print a failed command's error to `out`; the log filter never hides it
fn report_error<W: Write>(out: &mut W, e: &PlatformCliError) -> std::io::Result<()> {
    if e.is_user_facing() {
        debug!(error = %e, "Command failed");
        writeln!(out, "{}", e)
    } else {
        debug!(error = ?e, "Fatal error");
        writeln!(out, "Fatal error: {}", e)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        target,
        yes,
        command,
    } = cli;

    if let Commands::Init = command {
        return init_env_file(Path::new(".env"));
    }

    let config = config::Config::load()?;

    match command {
        Commands::Restore { backup, no_wait } => {
            restore::restore_backup(config, target.project, target.environment, backup, no_wait, yes)
                .await
        }
        Commands::Backups { limit, json } => {
            list::list_backups(config, target.project, target.environment, limit, json).await
        }
        Commands::Wait { activities } => {
            wait::wait_for_activities(config, target.project, activities).await
        }
        Commands::Init => Err(PlatformCliError::ConfigurationError(
            "init is handled before configuration is loaded".to_string(),
        )),
    }
}

fn init_env_file(env_file: &Path) -> Result<()> {
    if env_file.exists() {
        warn!(file = %env_file.display(), ".env file already exists, not overwriting");
        return Ok(());
    }

    let content = r#"# Platform restore helper configuration
# Fill in your actual values below

# API base URL
PLATFORM_API_URL=https://api.platform.sh/api

# API token sent as a bearer token
PLATFORM_API_TOKEN=your_api_token_here

# Default project and environment (override with --project / --environment)
PLATFORM_PROJECT=your_project_id
PLATFORM_ENVIRONMENT=main

# Optional: seconds between status checks while waiting for an activity
# PLATFORM_POLL_INTERVAL=1

# Optional: HTTP request timeout in seconds
# PLATFORM_REQUEST_TIMEOUT=30

# Optional: directory for the rolling log file
# PLATFORM_LOG_DIR=./logs
"#;

    std::fs::write(env_file, content)?;
    info!(file = %env_file.display(), "Created sample .env file, please edit with your actual values");

    Ok(())
}
