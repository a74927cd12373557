//! # Skeletor Migration Tools
//!
//! This crate moves a GitLab project's issue tracker to GitHub and drives
//! GitHub's source importer for the git history.
//!
//! ## Features
//!
//! - **Repository directory**: both repository listings, fetched once per run
//! - **Labels**: missing labels are created by name, existing ones are left alone
//! - **Milestones**: recreated in `iid` order, producing an id-to-number table
//! - **Issues and comments**: recreated in `iid` order with state, assignee,
//!   milestone and every note
//! - **Import**: create a private repository and poll GitHub's import job
//! - **Batches**: best-effort runs across every known repository
//!
//! ## Example
//!
//! ```rust,ignore
//! use skeletor_migrate::{MigrationContext, MigrationCoordinator, MigrationSettings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut settings = MigrationSettings::default();
//!     settings.gitlab.token = "glpat-xxx".to_string();
//!     settings.github.token = "ghp_xxx".to_string();
//!     settings.github.org = "acme".to_string();
//!
//!     let coordinator = MigrationCoordinator::new(MigrationContext::from_settings(&settings)?);
//!     let report = coordinator.migrate_one("widget").await?;
//!
//!     report.print_summary();
//!     Ok(())
//! }
//! ```

pub mod authors;
pub mod context;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod github;
pub mod gitlab;
pub mod importer;
pub mod issues;
pub mod labels;
pub mod milestones;
pub mod pacing;
pub mod progress;
pub mod settings;
pub mod types;

// Re-export main types
pub use authors::AuthorMapper;
pub use context::{ImportOptions, MigrationContext};
pub use coordinator::MigrationCoordinator;
pub use directory::RepositoryDirectory;
pub use error::{MigrationError, Result};
pub use github::{GitHubApi, GitHubClient};
pub use gitlab::{GitLabApi, GitLabClient};
pub use importer::RepositoryImporter;
pub use issues::IssueReplicator;
pub use labels::{LabelSyncOutcome, LabelSynchronizer};
pub use milestones::MilestoneTranslator;
pub use pacing::Pacer;
pub use progress::{
    ConsoleProgressReporter, MigrationPhase, MigrationProgress, ProgressCallback, ProgressUpdate,
};
pub use settings::MigrationSettings;
pub use types::*;

/// Version of the migration tools.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_report_counts_comments() {
        let mut report = MigrationReport::new("widget");
        report.issues.push(IssueRecord {
            gitlab_issue_id: 100,
            gitlab_issue_iid: 1,
            github_issue_number: 1,
            title: "Bug".to_string(),
            body: String::new(),
            labels: vec![],
            assignee_username: None,
            milestone_number: None,
            state: IssueState::Closed,
            comments: vec![
                CommentRecord {
                    gitlab_note_id: 5,
                    github_comment_id: 50,
                    body: "first".to_string(),
                },
                CommentRecord {
                    gitlab_note_id: 6,
                    github_comment_id: 51,
                    body: "second".to_string(),
                },
            ],
        });
        report.complete();

        assert_eq!(report.comments_migrated(), 2);
        assert!(report.duration().is_some());
    }
}
