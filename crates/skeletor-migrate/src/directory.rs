//! Process-lifetime cache of the repository listings of both platforms.

use crate::error::{MigrationError, Result};
use crate::github::GitHubApi;
use crate::gitlab::GitLabApi;
use crate::types::{Platform, RemoteRepository};

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

#[derive(Debug)]
struct Listings {
    gitlab: Vec<RemoteRepository>,
    github: Vec<RemoteRepository>,
}

/// Both repository listings, fetched at most once.
///
/// Concurrent first callers are serialized by the cell: one fetches, the
/// others wait for its result. A failed fetch leaves the cell empty so the
/// next call tries again.
pub struct RepositoryDirectory {
    gitlab: Arc<dyn GitLabApi>,
    github: Arc<dyn GitHubApi>,
    listings: OnceCell<Listings>,
}

impl RepositoryDirectory {
    pub fn new(gitlab: Arc<dyn GitLabApi>, github: Arc<dyn GitHubApi>) -> Self {
        Self {
            gitlab,
            github,
            listings: OnceCell::new(),
        }
    }

    async fn listings(&self) -> Result<&Listings> {
        self.listings
            .get_or_try_init(|| async {
                let gitlab = self
                    .gitlab
                    .list_projects()
                    .await
                    .map_err(|e| MigrationError::DirectoryFetch {
                        source: Box::new(e),
                    })?;
                let github = self
                    .github
                    .list_repos()
                    .await
                    .map_err(|e| MigrationError::DirectoryFetch {
                        source: Box::new(e),
                    })?;

                info!(
                    gitlab = gitlab.len(),
                    github = github.len(),
                    "Loaded repository directory"
                );

                Ok::<_, MigrationError>(Listings {
                    gitlab: gitlab.into_iter().map(RemoteRepository::from).collect(),
                    github: github.into_iter().map(RemoteRepository::from).collect(),
                })
            })
            .await
    }

    /// Fetch both listings unless they are already cached.
    pub async fn ensure_loaded(&self) -> Result<()> {
        self.listings().await.map(|_| ())
    }

    /// True once both listings are cached.
    pub fn is_loaded(&self) -> bool {
        self.listings.initialized()
    }

    /// Cached repositories of one platform; empty before the first load.
    pub fn repositories(&self, platform: Platform) -> &[RemoteRepository] {
        match (self.listings.get(), platform) {
            (Some(l), Platform::GitLab) => &l.gitlab,
            (Some(l), Platform::GitHub) => &l.github,
            (None, _) => &[],
        }
    }

    /// Exact, case-sensitive name lookup in the cached listing.
    pub fn find_by_name(&self, platform: Platform, name: &str) -> Option<&RemoteRepository> {
        self.repositories(platform).iter().find(|r| r.name == name)
    }
}
