//! Recreates GitLab milestones on GitHub.

use crate::context::MigrationContext;
use crate::error::{MigrationError, Result};
use crate::github::CreateMilestoneRequest;
use crate::progress::MigrationPhase;
use crate::types::{IssueState, MilestoneMapping, RemoteRepository};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Translates milestones and records the GitLab id to GitHub number table.
pub struct MilestoneTranslator<'a> {
    ctx: &'a MigrationContext,
}

impl<'a> MilestoneTranslator<'a> {
    pub fn new(ctx: &'a MigrationContext) -> Self {
        Self { ctx }
    }

    /// Create one GitHub milestone per GitLab milestone, ascending by `iid`.
    ///
    /// Strictly sequential: GitHub numbers milestones in creation order and
    /// issue replication depends on the finished table. The first failure
    /// aborts the translation without rolling anything back.
    pub async fn translate(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
    ) -> Result<Vec<MilestoneMapping>> {
        self.run(github_repo, gitlab_repo)
            .await
            .map_err(|e| MigrationError::milestone(&github_repo.name, e))
    }

    async fn run(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
    ) -> Result<Vec<MilestoneMapping>> {
        let mut milestones = self.ctx.gitlab.list_milestones(gitlab_repo.id).await?;
        milestones.sort_by_key(|m| m.iid);

        self.ctx
            .progress
            .set_phase(MigrationPhase::TranslatingMilestones, milestones.len() as u64);

        let mut mappings = Vec::with_capacity(milestones.len());
        for ms in milestones {
            let state = IssueState::from_gitlab(&ms.state);
            let due_on = ms.due_date.as_deref().and_then(|d| {
                let converted = due_date_to_utc(d);
                if converted.is_none() {
                    warn!(milestone = ms.iid, due_date = d, "Ignoring unparseable due date");
                }
                converted
            });

            self.ctx.pacer.pause().await;
            let created = self
                .ctx
                .github
                .create_milestone(
                    &github_repo.name,
                    &CreateMilestoneRequest {
                        title: ms.title.clone(),
                        description: ms.description.clone().filter(|d| !d.is_empty()),
                        state,
                        due_on: due_on.clone(),
                    },
                )
                .await?;

            debug!(
                repo = %github_repo.name,
                gitlab_id = ms.id,
                github_number = created.number,
                "Created milestone"
            );
            self.ctx.progress.increment(Some(&ms.title));

            mappings.push(MilestoneMapping {
                gitlab_milestone_id: ms.id,
                github_milestone_number: created.number,
                title: ms.title,
                description: ms.description,
                due_date: due_on,
                state,
            });
        }

        info!(
            repo = %github_repo.name,
            milestones = mappings.len(),
            "Milestones translated"
        );
        Ok(mappings)
    }
}

/// Convert a GitLab `YYYY-MM-DD` due date (or a full RFC 3339 timestamp)
/// to an absolute UTC timestamp at midnight.
pub fn due_date_to_utc(date: &str) -> Option<String> {
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        let midnight = day.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(midnight.format("%Y-%m-%dT%H:%M:%SZ").to_string());
    }

    chrono::DateTime::parse_from_rfc3339(date)
        .ok()
        .map(|ts| {
            ts.with_timezone(&chrono::Utc)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_date_from_plain_date() {
        assert_eq!(
            due_date_to_utc("2024-05-01").as_deref(),
            Some("2024-05-01T00:00:00Z")
        );
    }

    #[test]
    fn test_due_date_from_timestamp_is_normalized_to_utc() {
        assert_eq!(
            due_date_to_utc("2024-05-01T02:30:00+02:00").as_deref(),
            Some("2024-05-01T00:30:00Z")
        );
    }

    #[test]
    fn test_due_date_garbage() {
        assert_eq!(due_date_to_utc("next tuesday"), None);
    }
}
