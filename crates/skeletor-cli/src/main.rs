//! Skeletor CLI - moves GitLab projects and their issue trackers to GitHub.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

/// Skeletor - GitLab to GitHub migration
#[derive(Parser, Debug)]
#[command(name = "skeletor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file
    #[arg(short, long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured known repositories
    List,

    /// List projects on GitLab and repositories on GitHub
    Projects,

    /// Create a GitHub repository and import a GitLab project's history into it
    Import {
        /// Project name
        name: String,
    },

    /// Import every known repository
    ImportAll,

    /// Delete a repository from the GitHub organization
    Remove {
        /// Repository name
        name: String,
    },

    /// Migrate labels, milestones, issues and comments of one repository
    Migrate {
        /// Repository name
        name: String,
    },

    /// Migrate every known repository
    MigrateAll,

    /// Show how GitLab users map to GitHub logins
    Authors {
        /// Project name (default: every GitLab project)
        name: Option<String>,
    },
}

fn init_tracing(verbose: u8, format: LogFormat) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("skeletor={log_level},skeletor_migrate={log_level}").into()),
    );

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match commands::run(cli.command, &cli.config).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", console::style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}
