//! Per-repository and batch orchestration.

use crate::authors::AuthorMapper;
use crate::context::MigrationContext;
use crate::error::{MigrationError, Result};
use crate::importer::RepositoryImporter;
use crate::issues::IssueReplicator;
use crate::labels::LabelSynchronizer;
use crate::milestones::MilestoneTranslator;
use crate::progress::MigrationPhase;
use crate::types::{
    AuthorReport, BatchReport, ImportResult, MigrationReport, Platform, RemoteRepository,
};

use futures::stream::{self, StreamExt};
use std::future::Future;
use tracing::{error, info};

/// Entry point for every operation of the command surface.
pub struct MigrationCoordinator {
    ctx: MigrationContext,
}

impl MigrationCoordinator {
    pub fn new(ctx: MigrationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &MigrationContext {
        &self.ctx
    }

    async fn load(&self) -> Result<()> {
        if !self.ctx.directory.is_loaded() {
            self.ctx
                .progress
                .set_phase(MigrationPhase::LoadingDirectory, 2);
        }
        self.ctx.directory.ensure_loaded().await
    }

    /// Both cached listings, GitLab first.
    pub async fn projects(&self) -> Result<(Vec<RemoteRepository>, Vec<RemoteRepository>)> {
        self.load().await?;
        Ok((
            self.ctx.directory.repositories(Platform::GitLab).to_vec(),
            self.ctx.directory.repositories(Platform::GitHub).to_vec(),
        ))
    }

    /// Migrate labels, milestones, issues and comments of one repository.
    ///
    /// The GitHub repository must already exist; the GitLab project of the
    /// same name is the source.
    pub async fn migrate_one(&self, name: &str) -> Result<MigrationReport> {
        self.load().await?;

        let github_repo = self
            .ctx
            .directory
            .find_by_name(Platform::GitHub, name)
            .ok_or_else(|| MigrationError::UnknownRepository {
                repo: name.to_string(),
            })?;
        let gitlab_repo = self
            .ctx
            .directory
            .find_by_name(Platform::GitLab, name)
            .ok_or_else(|| MigrationError::SourceNotFound {
                repo: name.to_string(),
            })?;

        info!(repo = name, "Migrating repository");
        let mut report = MigrationReport::new(name);

        report.labels_added = LabelSynchronizer::new(&self.ctx)
            .sync(github_repo, gitlab_repo)
            .await?
            .added;

        report.milestones = MilestoneTranslator::new(&self.ctx)
            .translate(github_repo, gitlab_repo)
            .await?;

        report.issues = IssueReplicator::new(&self.ctx)
            .replicate(github_repo, gitlab_repo, &report.milestones)
            .await?;

        report.complete();
        self.ctx.progress.set_phase(MigrationPhase::Complete, 1);
        info!(
            repo = name,
            labels = report.labels_added.len(),
            milestones = report.milestones.len(),
            issues = report.issues.len(),
            comments = report.comments_migrated(),
            "Repository migrated"
        );
        Ok(report)
    }

    /// Migrate every known repository, continuing past failures.
    pub async fn migrate_all(&self) -> Result<BatchReport> {
        self.load().await?;

        let targets = if self.ctx.known_repositories.is_empty() {
            self.ctx
                .directory
                .repositories(Platform::GitLab)
                .iter()
                .filter(|p| {
                    self.ctx
                        .directory
                        .find_by_name(Platform::GitHub, &p.name)
                        .is_some()
                })
                .map(|p| p.name.clone())
                .collect()
        } else {
            self.ctx.known_repositories.clone()
        };

        Ok(self
            .batch("migrate", targets, move |name| async move {
                self.migrate_one(&name).await.map(|_| ())
            })
            .await)
    }

    /// Import one repository's git history into a new GitHub repository.
    pub async fn import_one(&self, name: &str) -> Result<ImportResult> {
        self.load().await?;
        RepositoryImporter::new(&self.ctx).import(name).await
    }

    /// Import every known repository, continuing past failures.
    pub async fn import_all(&self) -> Result<BatchReport> {
        self.load().await?;

        let targets = if self.ctx.known_repositories.is_empty() {
            self.ctx
                .directory
                .repositories(Platform::GitLab)
                .iter()
                .map(|p| p.name.clone())
                .collect()
        } else {
            self.ctx.known_repositories.clone()
        };

        Ok(self
            .batch("import", targets, move |name| async move {
                self.import_one(&name).await.map(|_| ())
            })
            .await)
    }

    /// Delete a repository from the GitHub organization.
    pub async fn remove_one(&self, name: &str) -> Result<()> {
        self.load().await?;

        if self
            .ctx
            .directory
            .find_by_name(Platform::GitHub, name)
            .is_none()
        {
            return Err(MigrationError::UnknownRepository {
                repo: name.to_string(),
            });
        }

        self.ctx
            .progress
            .set_phase(MigrationPhase::RemovingRepository, 1);
        self.ctx.github.delete_repo(name).await?;
        self.ctx.progress.increment(Some(name));
        info!(repo = name, "Repository removed");
        Ok(())
    }

    /// Username mapping of one project, or of every cached project.
    pub async fn map_authors(&self, name: Option<&str>) -> Result<Vec<AuthorReport>> {
        self.load().await?;

        let projects: Vec<&RemoteRepository> = match name {
            Some(name) => vec![self
                .ctx
                .directory
                .find_by_name(Platform::GitLab, name)
                .ok_or_else(|| MigrationError::SourceNotFound {
                    repo: name.to_string(),
                })?],
            None => self
                .ctx
                .directory
                .repositories(Platform::GitLab)
                .iter()
                .collect(),
        };

        let mapper = AuthorMapper::new(&self.ctx);
        let mut reports = Vec::with_capacity(projects.len());
        for project in projects {
            reports.push(mapper.map(project).await?);
        }
        Ok(reports)
    }

    /// Run `op` for every target with at most `concurrency` in flight.
    /// Failures are logged and recorded; they never stop the batch.
    async fn batch<F, Fut>(&self, operation: &str, targets: Vec<String>, op: F) -> BatchReport
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        info!(
            operation,
            repositories = targets.len(),
            concurrency = self.ctx.concurrency,
            "Starting batch"
        );

        // Concurrent repositories share one tracker; report them as a single bar.
        let tracked = self.ctx.concurrency > 1;
        let progress = &self.ctx.progress;
        if tracked {
            progress.begin_batch(targets.len() as u64);
        }

        let mut outcomes: Vec<(String, Result<()>)> = stream::iter(targets)
            .map(|name| {
                let fut = op(name.clone());
                async move {
                    let outcome = fut.await;
                    if tracked {
                        progress.batch_item_done(&name);
                    }
                    (name, outcome)
                }
            })
            .buffer_unordered(self.ctx.concurrency)
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        if tracked {
            progress.end_batch();
        }

        let mut report = BatchReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded(name),
                Err(e) => {
                    error!(operation, repo = %name, remote = e.is_remote(), "{e}");
                    report.failed(name, e);
                }
            }
        }
        report
    }
}
