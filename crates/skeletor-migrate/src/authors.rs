//! Reports how the GitLab users of a project map onto GitHub logins.

use crate::context::MigrationContext;
use crate::error::Result;
use crate::types::{AuthorReport, RemoteRepository};

use std::collections::BTreeSet;
use tracing::info;

/// Collects issue authors, assignees and note authors of a project.
pub struct AuthorMapper<'a> {
    ctx: &'a MigrationContext,
}

impl<'a> AuthorMapper<'a> {
    pub fn new(ctx: &'a MigrationContext) -> Self {
        Self { ctx }
    }

    /// Resolve every distinct GitLab username of `gitlab_repo` through the
    /// configured user mapping. Read-only; nothing is written to GitHub.
    pub async fn map(&self, gitlab_repo: &RemoteRepository) -> Result<AuthorReport> {
        let issues = self.ctx.gitlab.list_issues(gitlab_repo.id).await?;

        let mut usernames = BTreeSet::new();
        for issue in &issues {
            usernames.extend(issue.author.iter().map(|u| u.username.clone()));
            usernames.extend(issue.assignee.iter().map(|u| u.username.clone()));
            usernames.extend(issue.assignees.iter().map(|u| u.username.clone()));

            let notes = self
                .ctx
                .gitlab
                .list_notes(gitlab_repo.id, issue.iid)
                .await?;
            usernames.extend(
                notes
                    .into_iter()
                    .filter_map(|n| n.author.map(|u| u.username)),
            );
        }

        let authors = usernames
            .into_iter()
            .map(|username| {
                let resolution = self.ctx.users.resolve(&username);
                (username, resolution)
            })
            .collect();

        info!(repo = %gitlab_repo.name, issues = issues.len(), "Mapped authors");
        Ok(AuthorReport {
            repository: gitlab_repo.name.clone(),
            authors,
        })
    }
}
