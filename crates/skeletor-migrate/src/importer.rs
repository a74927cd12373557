//! Creates a GitHub repository and imports the GitLab git history into it.
//!
//! One run walks
//! `START → VERIFY_SOURCE_EXISTS → VERIFY_TARGET_ABSENT → CREATE_TARGET →
//! TRIGGER_IMPORT → POLL_IMPORT → COMPLETE | FAILED`.
//! An existing target is an error: imports are never resumed or overwritten.

use crate::context::MigrationContext;
use crate::error::{MigrationError, Result};
use crate::github::{CreateRepoRequest, StartImportRequest};
use crate::progress::MigrationPhase;
use crate::types::{ImportResult, ImportState, Platform, RemoteRepository};

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Import job states reported by GitHub that end polling.
const STATUS_COMPLETE: &str = "complete";
const STATUS_ERROR: &str = "error";

/// Drives the import state machine for one repository at a time.
pub struct RepositoryImporter<'a> {
    ctx: &'a MigrationContext,
}

struct Run {
    repo: String,
    transitions: Vec<ImportState>,
}

impl Run {
    fn enter(&mut self, state: ImportState) {
        debug!(repo = %self.repo, %state, "Import transition");
        self.transitions.push(state);
    }

    fn fail(&mut self, error: MigrationError) -> MigrationError {
        self.enter(ImportState::Failed);
        warn!(repo = %self.repo, states = ?self.transitions, "Import failed: {error}");
        error
    }
}

impl<'a> RepositoryImporter<'a> {
    pub fn new(ctx: &'a MigrationContext) -> Self {
        Self { ctx }
    }

    /// Import the GitLab project `project` into a new private GitHub
    /// repository of the same name. The directory must already be loaded.
    pub async fn import(&self, project: &str) -> Result<ImportResult> {
        let started_at = Utc::now();
        let mut run = Run {
            repo: project.to_string(),
            transitions: Vec::new(),
        };
        run.enter(ImportState::Start);
        info!(repo = project, "Importing repository");

        run.enter(ImportState::VerifySourceExists);
        let Some(source) = self
            .ctx
            .directory
            .find_by_name(Platform::GitLab, project)
            .cloned()
        else {
            return Err(run.fail(MigrationError::SourceNotFound {
                repo: project.to_string(),
            }));
        };

        run.enter(ImportState::VerifyTargetAbsent);
        if self
            .ctx
            .directory
            .find_by_name(Platform::GitHub, project)
            .is_some()
        {
            return Err(run.fail(MigrationError::TargetAlreadyExists {
                repo: project.to_string(),
            }));
        }

        run.enter(ImportState::CreateTarget);
        self.ctx
            .progress
            .set_phase(MigrationPhase::CreatingRepository, 1);
        let request = CreateRepoRequest {
            name: project.to_string(),
            private: true,
            description: repository_description(&source),
        };
        if let Err(e) = self.ctx.github.create_repo(&request).await {
            return Err(run.fail(e));
        }
        self.ctx.progress.increment(Some(project));

        run.enter(ImportState::TriggerImport);
        let trigger = StartImportRequest {
            vcs_url: source.web_url.clone(),
            vcs: "git".to_string(),
            vcs_username: self.ctx.import.vcs_username.clone(),
            vcs_password: self.ctx.import.vcs_password.clone(),
        };
        if let Err(e) = self.ctx.github.start_import(project, &trigger).await {
            return Err(run.fail(e));
        }

        run.enter(ImportState::PollImport);
        self.ctx.progress.set_phase(MigrationPhase::Importing, 0);
        let polls = match self.poll(project).await {
            Ok(polls) => polls,
            Err(e) => return Err(run.fail(e)),
        };

        run.enter(ImportState::Complete);
        info!(repo = project, polls, "Import complete");

        Ok(ImportResult {
            repository: project.to_string(),
            transitions: run.transitions,
            polls,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Poll until the job reports `complete` or `error`, sleeping between
    /// polls. Returns the number of polls issued.
    async fn poll(&self, repo: &str) -> Result<u32> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            let status = self.ctx.github.import_status(repo).await?;
            polls += 1;
            debug!(repo, polls, status = %status.status, "Import status");
            self.ctx.progress.message(&status.status);

            match status.status.as_str() {
                STATUS_COMPLETE => return Ok(polls),
                STATUS_ERROR => {
                    return Err(MigrationError::ImportFailed {
                        repo: repo.to_string(),
                        status_text: status
                            .status_text
                            .unwrap_or_else(|| STATUS_ERROR.to_string()),
                    })
                }
                _ => {}
            }

            if let Some(timeout) = self.ctx.import.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(MigrationError::ImportTimedOut {
                        repo: repo.to_string(),
                        elapsed,
                    });
                }
            }

            tokio::time::sleep(self.ctx.import.poll_interval).await;
        }
    }
}

/// GitHub repository description for an imported project: control
/// whitespace collapsed to spaces, the name when the source has none.
pub fn repository_description(source: &RemoteRepository) -> String {
    let description = source
        .description
        .as_deref()
        .unwrap_or_default()
        .replace(['\r', '\n', '\t'], " ");

    if description.trim().is_empty() {
        source.name.clone()
    } else {
        description
    }
}
