//! Recreates GitLab issues and their notes on GitHub.

use crate::context::MigrationContext;
use crate::error::{MigrationError, Result};
use crate::github::CreateIssueRequest;
use crate::gitlab::GitLabIssue;
use crate::progress::MigrationPhase;
use crate::types::{
    find_milestone_number, CommentRecord, IssueRecord, IssueState, MilestoneMapping,
    RemoteRepository,
};

use tracing::{debug, info};

/// Replicates issues one at a time, in ascending `iid` order.
///
/// GitHub assigns issue numbers in call order, so running issues
/// concurrently would scramble the numbering relative to GitLab.
pub struct IssueReplicator<'a> {
    ctx: &'a MigrationContext,
}

impl<'a> IssueReplicator<'a> {
    pub fn new(ctx: &'a MigrationContext) -> Self {
        Self { ctx }
    }

    /// Recreate every issue of `gitlab_repo` in `github_repo`, then replay
    /// its notes. The first failing step aborts the whole repository;
    /// issues created before it are kept.
    pub async fn replicate(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
        milestones: &[MilestoneMapping],
    ) -> Result<Vec<IssueRecord>> {
        let repo = github_repo.name.as_str();

        let mut issues = self
            .ctx
            .gitlab
            .list_issues(gitlab_repo.id)
            .await
            .map_err(|e| MigrationError::issue_replication(repo, e))?;
        issues.sort_by_key(|i| i.iid);

        self.ctx
            .progress
            .set_phase(MigrationPhase::ReplicatingIssues, issues.len() as u64);

        let mut records = Vec::with_capacity(issues.len());
        for issue in issues {
            let mut record = self
                .create_issue(repo, &issue, milestones)
                .await
                .map_err(|e| MigrationError::issue_replication(repo, e))?;

            record.comments = self
                .replicate_comments(github_repo, gitlab_repo, &record)
                .await?;

            self.ctx
                .progress
                .increment(Some(&format!("Issue #{}", issue.iid)));
            records.push(record);
        }

        info!(repo, issues = records.len(), "Issues replicated");
        Ok(records)
    }

    async fn create_issue(
        &self,
        repo: &str,
        issue: &GitLabIssue,
        milestones: &[MilestoneMapping],
    ) -> Result<IssueRecord> {
        let assignee = issue
            .assignee_username()
            .and_then(|username| self.ctx.users.resolve(username).login().map(str::to_string));

        // Unknown milestones are dropped silently.
        let milestone = issue
            .milestone
            .as_ref()
            .and_then(|m| find_milestone_number(milestones, m.id));

        let request = CreateIssueRequest {
            title: issue.title.clone(),
            body: issue.description.clone().unwrap_or_default(),
            labels: issue.labels.clone(),
            assignees: assignee.iter().cloned().collect(),
            milestone,
        };

        self.ctx.pacer.pause().await;
        let created = self.ctx.github.create_issue(repo, &request).await?;

        // Creation always yields an open issue; the final state is applied
        // by a separate update.
        let state = IssueState::from_gitlab(&issue.state);
        self.ctx.pacer.pause().await;
        let updated = self
            .ctx
            .github
            .update_issue_state(repo, created.number, state)
            .await?;

        debug!(
            repo,
            iid = issue.iid,
            number = created.number,
            state = %updated.state,
            "Created issue"
        );

        Ok(IssueRecord {
            gitlab_issue_id: issue.id,
            gitlab_issue_iid: issue.iid,
            github_issue_number: created.number,
            title: request.title,
            body: request.body,
            labels: request.labels,
            assignee_username: assignee,
            milestone_number: milestone,
            state: updated.state,
            comments: Vec::new(),
        })
    }

    /// Replay the notes of one replicated issue as GitHub comments, oldest
    /// first. Only the note body is carried over.
    pub async fn replicate_comments(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
        issue: &IssueRecord,
    ) -> Result<Vec<CommentRecord>> {
        self.run_comments(github_repo, gitlab_repo, issue)
            .await
            .map_err(|e| {
                MigrationError::comment_replication(&github_repo.name, issue.gitlab_issue_iid, e)
            })
    }

    async fn run_comments(
        &self,
        github_repo: &RemoteRepository,
        gitlab_repo: &RemoteRepository,
        issue: &IssueRecord,
    ) -> Result<Vec<CommentRecord>> {
        let mut notes = self
            .ctx
            .gitlab
            .list_notes(gitlab_repo.id, issue.gitlab_issue_iid)
            .await?;
        notes.sort_by_key(|n| n.id);

        let mut comments = Vec::with_capacity(notes.len());
        for note in notes {
            self.ctx.pacer.pause().await;
            let created = self
                .ctx
                .github
                .create_comment(&github_repo.name, issue.github_issue_number, &note.body)
                .await?;

            comments.push(CommentRecord {
                gitlab_note_id: note.id,
                github_comment_id: created.id,
                body: note.body,
            });
        }

        debug!(
            repo = %github_repo.name,
            number = issue.github_issue_number,
            comments = comments.len(),
            "Comments replicated"
        );
        Ok(comments)
    }
}
