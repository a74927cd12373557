//! Copies GitLab labels that are missing on GitHub.

use crate::context::MigrationContext;
use crate::error::{MigrationError, Result};
use crate::github::CreateLabelRequest;
use crate::progress::MigrationPhase;
use crate::types::{LabelDef, RemoteRepository};

use std::collections::HashSet;
use tracing::{debug, info};

/// Labels created by one sync.
#[derive(Debug, Clone, Default)]
pub struct LabelSyncOutcome {
    pub added: Vec<LabelDef>,
}

/// Creates labels by name; existing labels are never updated.
pub struct LabelSynchronizer<'a> {
    ctx: &'a MigrationContext,
}

impl<'a> LabelSynchronizer<'a> {
    pub fn new(ctx: &'a MigrationContext) -> Self {
        Self { ctx }
    }

    /// Create every GitLab label whose name is not yet present on GitHub.
    ///
    /// Names are compared case-sensitively. A project without labels is
    /// answered without contacting GitHub. A failed create stops the sync;
    /// labels created before it stay in place.
    pub async fn sync(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
    ) -> Result<LabelSyncOutcome> {
        self.run(github_repo, gitlab_repo)
            .await
            .map_err(|e| MigrationError::label_sync(&github_repo.name, e))
    }

    async fn run(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
    ) -> Result<LabelSyncOutcome> {
        let source: Vec<LabelDef> = self
            .ctx
            .gitlab
            .list_labels(gitlab_repo.id)
            .await?
            .into_iter()
            .map(|l| LabelDef::new(l.name, &l.color))
            .collect();

        if source.is_empty() {
            debug!(repo = %github_repo.name, "No labels on GitLab");
            return Ok(LabelSyncOutcome::default());
        }

        let existing: HashSet<String> = self
            .ctx
            .github
            .list_labels(&github_repo.name)
            .await?
            .into_iter()
            .map(|l| l.name)
            .collect();

        let missing = missing_labels(source, &existing);
        self.ctx
            .progress
            .set_phase(MigrationPhase::SyncingLabels, missing.len() as u64);

        let mut outcome = LabelSyncOutcome::default();
        for label in missing {
            self.ctx.pacer.pause().await;
            self.ctx
                .github
                .create_label(
                    &github_repo.name,
                    &CreateLabelRequest {
                        name: label.name.clone(),
                        color: label.color.clone(),
                    },
                )
                .await?;

            debug!(repo = %github_repo.name, label = %label.name, "Created label");
            self.ctx.progress.increment(Some(&label.name));
            outcome.added.push(label);
        }

        info!(
            repo = %github_repo.name,
            added = outcome.added.len(),
            "Labels synced"
        );
        Ok(outcome)
    }
}

/// Source labels whose name is absent from `existing`, in source order.
/// Duplicate source names are created once.
fn missing_labels(source: Vec<LabelDef>, existing: &HashSet<String>) -> Vec<LabelDef> {
    let mut seen = HashSet::new();
    source
        .into_iter()
        .filter(|l| !existing.contains(&l.name) && seen.insert(l.name.clone()))
        .collect()
}
