//! CLI command implementations.

use crate::config;
use crate::Commands;

use anyhow::{Context, Result};
use console::{style, Term};
use skeletor_migrate::{
    BatchReport, ConsoleProgressReporter, MigrationContext, MigrationCoordinator,
    MigrationProgress, MigrationSettings, RemoteRepository, UserResolution,
};
use std::path::Path;

/// How a command ended when it did not error out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    /// A batch ran to the end but some repositories failed.
    PartialFailure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    fn from_batch(report: &BatchReport) -> Self {
        if report.is_successful() {
            Self::Success
        } else {
            Self::PartialFailure
        }
    }
}

/// Coordinator plus the optional console progress bar driving it.
struct Session {
    coordinator: MigrationCoordinator,
    reporter: Option<ConsoleProgressReporter>,
}

impl Session {
    fn open(settings: &MigrationSettings) -> Result<Self> {
        let reporter = Term::stderr()
            .is_term()
            .then(ConsoleProgressReporter::new);

        let mut ctx =
            MigrationContext::from_settings(settings).context("Failed to configure migration")?;
        if let Some(reporter) = &reporter {
            ctx = ctx.with_progress(MigrationProgress::with_callback(reporter.callback()));
        }

        Ok(Self {
            coordinator: MigrationCoordinator::new(ctx),
            reporter,
        })
    }

    fn finish(&self, message: &str) {
        if let Some(reporter) = &self.reporter {
            reporter.finish(message);
        }
    }
}

/// Dispatch one subcommand.
pub(crate) async fn run(command: Commands, config_path: &Path) -> Result<Outcome> {
    let settings = config::load(config_path)?;

    match command {
        Commands::List => {
            list(&settings);
            Ok(Outcome::Success)
        }
        Commands::Projects => {
            let session = Session::open(&settings)?;
            let (gitlab, github) = session.coordinator.projects().await?;
            session.finish("Loaded");
            print_repositories("GitLab projects", &gitlab);
            print_repositories("GitHub repositories", &github);
            Ok(Outcome::Success)
        }
        Commands::Import { name } => {
            let session = Session::open(&settings)?;
            let result = session.coordinator.import_one(&name).await?;
            session.finish("Imported");
            println!(
                "{} {} imported after {} status checks",
                style("✓").green(),
                result.repository,
                result.polls
            );
            Ok(Outcome::Success)
        }
        Commands::ImportAll => {
            let session = Session::open(&settings)?;
            let report = session.coordinator.import_all().await?;
            session.finish("Done");
            report.print_summary();
            Ok(Outcome::from_batch(&report))
        }
        Commands::Remove { name } => {
            let session = Session::open(&settings)?;
            session.coordinator.remove_one(&name).await?;
            session.finish("Removed");
            println!("{} {name} removed", style("✓").green());
            Ok(Outcome::Success)
        }
        Commands::Migrate { name } => {
            let session = Session::open(&settings)?;
            let report = session.coordinator.migrate_one(&name).await?;
            session.finish("Migrated");
            report.print_summary();
            Ok(Outcome::Success)
        }
        Commands::MigrateAll => {
            let session = Session::open(&settings)?;
            let report = session.coordinator.migrate_all().await?;
            session.finish("Done");
            report.print_summary();
            Ok(Outcome::from_batch(&report))
        }
        Commands::Authors { name } => {
            let session = Session::open(&settings)?;
            let reports = session.coordinator.map_authors(name.as_deref()).await?;
            session.finish("Mapped");
            for report in &reports {
                println!("\n{}", style(&report.repository).bold());
                for (username, resolution) in &report.authors {
                    println!("  {username} -> {}", describe(resolution));
                }
            }
            Ok(Outcome::Success)
        }
    }
}

fn list(settings: &MigrationSettings) {
    if settings.repositories.is_empty() {
        println!("No known repositories configured.");
        return;
    }
    for name in &settings.repositories {
        println!("{name}");
    }
}

fn print_repositories(title: &str, repositories: &[RemoteRepository]) {
    println!("\n{} ({})", style(title).bold(), repositories.len());
    for repo in repositories {
        println!("{}", repository_line(repo));
    }
}

/// `id:name:description:url`
fn repository_line(repo: &RemoteRepository) -> String {
    format!(
        "{}:{}:{}:{}",
        repo.id,
        repo.name,
        repo.description.as_deref().unwrap_or_default(),
        repo.web_url
    )
}

fn describe(resolution: &UserResolution) -> String {
    match resolution {
        UserResolution::Mapped(login) => login.clone(),
        UserResolution::Default(login) => format!("{login} (default)"),
        UserResolution::Unmapped => style("unmapped").yellow().to_string(),
    }
}
