//! Shared state handed to every migration component.

use crate::directory::RepositoryDirectory;
use crate::error::Result;
use crate::github::{GitHubApi, GitHubClient};
use crate::gitlab::{GitLabApi, GitLabClient};
use crate::pacing::Pacer;
use crate::progress::MigrationProgress;
use crate::settings::MigrationSettings;
use crate::types::UserMapping;

use std::sync::Arc;
use std::time::Duration;

/// Credentials and timing of the GitHub import job.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// GitLab login used by GitHub to clone the source.
    pub vcs_username: String,
    /// GitLab password or token used by GitHub to clone the source.
    pub vcs_password: String,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Give up polling after this long; `None` polls forever.
    pub timeout: Option<Duration>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            vcs_username: String::new(),
            vcs_password: String::new(),
            poll_interval: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(3600)),
        }
    }
}

/// Everything a single run needs: both clients, the repository cache,
/// the username table and pacing.
pub struct MigrationContext {
    pub gitlab: Arc<dyn GitLabApi>,
    pub github: Arc<dyn GitHubApi>,
    pub directory: RepositoryDirectory,
    pub users: UserMapping,
    pub pacer: Pacer,
    pub import: ImportOptions,
    pub progress: MigrationProgress,
    /// Known repository names; empty means "everything listed".
    pub known_repositories: Vec<String>,
    /// Repositories processed at once by batch operations.
    pub concurrency: usize,
}

impl MigrationContext {
    /// Build a context around arbitrary API implementations.
    pub fn new(gitlab: Arc<dyn GitLabApi>, github: Arc<dyn GitHubApi>) -> Self {
        let directory = RepositoryDirectory::new(gitlab.clone(), github.clone());
        Self {
            gitlab,
            github,
            directory,
            users: UserMapping::default(),
            pacer: Pacer::default(),
            import: ImportOptions::default(),
            progress: MigrationProgress::new(),
            known_repositories: Vec::new(),
            concurrency: 1,
        }
    }

    /// Build a context with real HTTP clients from validated settings.
    pub fn from_settings(settings: &MigrationSettings) -> Result<Self> {
        settings.validate()?;

        let gitlab = GitLabClient::new(&settings.gitlab.url, &settings.gitlab.token)?;
        let github = GitHubClient::new(
            &settings.github.url,
            &settings.github.token,
            &settings.github.org,
        )?;

        let tuning = &settings.migration;
        Ok(Self::new(Arc::new(gitlab), Arc::new(github))
            .with_users(settings.user_mapping())
            .with_pacer(Pacer::new(tuning.write_delay()))
            .with_import_options(ImportOptions {
                vcs_username: settings.gitlab.username.clone(),
                vcs_password: settings.gitlab.password.clone(),
                poll_interval: tuning.poll_interval(),
                timeout: tuning.import_timeout(),
            })
            .with_known_repositories(settings.repositories.clone())
            .with_concurrency(tuning.concurrency))
    }

    pub fn with_users(mut self, users: UserMapping) -> Self {
        self.users = users;
        self
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_import_options(mut self, import: ImportOptions) -> Self {
        self.import = import;
        self
    }

    /// Set a progress tracker.
    pub fn with_progress(mut self, progress: MigrationProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_known_repositories(mut self, names: Vec<String>) -> Self {
        self.known_repositories = names;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}
