//! Common types for migration operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Remote platform types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GitHub.
    GitHub,
    /// GitLab.
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// A repository (GitHub) or project (GitLab) as seen in a listing.
///
/// `name` is the only field compared across platforms; `id` is local to
/// the platform that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub platform: Platform,
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub clone_url: String,
    pub web_url: String,
}

/// Label definition, color without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDef {
    pub name: String,
    pub color: String,
}

impl LabelDef {
    /// Create a label definition, normalizing the color.
    pub fn new(name: impl Into<String>, color: &str) -> Self {
        Self {
            name: name.into(),
            color: color.trim_start_matches('#').to_string(),
        }
    }
}

/// Open/closed state shared by issues and milestones on GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Map a GitLab state string. Only `closed` is closed; `opened`,
    /// `active`, `reopened` and anything else are open.
    pub fn from_gitlab(state: &str) -> Self {
        if state == "closed" {
            Self::Closed
        } else {
            Self::Open
        }
    }

    /// GitHub wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GitLab milestone recreated on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneMapping {
    pub gitlab_milestone_id: u64,
    pub github_milestone_number: u64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub state: IssueState,
}

/// Resolve a GitLab milestone id through a translated mapping table.
pub fn find_milestone_number(mappings: &[MilestoneMapping], gitlab_id: u64) -> Option<u64> {
    mappings
        .iter()
        .find(|m| m.gitlab_milestone_id == gitlab_id)
        .map(|m| m.github_milestone_number)
}

/// A GitLab issue recreated on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub gitlab_issue_id: u64,
    pub gitlab_issue_iid: u64,
    pub github_issue_number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignee_username: Option<String>,
    pub milestone_number: Option<u64>,
    pub state: IssueState,
    pub comments: Vec<CommentRecord>,
}

/// A GitLab note recreated as a GitHub comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub gitlab_note_id: u64,
    pub github_comment_id: u64,
    pub body: String,
}

/// Static GitLab-to-GitHub username table.
///
/// Unmapped usernames resolve to `default_assignee`; when no default is
/// configured the issue is created unassigned.
#[derive(Debug, Clone, Default)]
pub struct UserMapping {
    entries: HashMap<String, String>,
    default_assignee: Option<String>,
}

/// How a GitLab username resolved through a [`UserMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "login", rename_all = "lowercase")]
pub enum UserResolution {
    /// Explicit entry in the mapping table.
    Mapped(String),
    /// No entry; the default assignee is used.
    Default(String),
    /// No entry and no default.
    Unmapped,
}

impl UserResolution {
    /// The GitHub login this resolution points to, if any.
    pub fn login(&self) -> Option<&str> {
        match self {
            Self::Mapped(login) | Self::Default(login) => Some(login),
            Self::Unmapped => None,
        }
    }
}

impl UserMapping {
    /// Create a mapping from a table and an optional fallback login.
    pub fn new(entries: HashMap<String, String>, default_assignee: Option<String>) -> Self {
        Self {
            entries,
            default_assignee: default_assignee.filter(|d| !d.is_empty()),
        }
    }

    /// Add a single entry.
    pub fn with_user(mut self, gitlab: impl Into<String>, github: impl Into<String>) -> Self {
        self.entries.insert(gitlab.into(), github.into());
        self
    }

    /// Resolve a GitLab username.
    pub fn resolve(&self, gitlab_username: &str) -> UserResolution {
        match self.entries.get(gitlab_username) {
            Some(login) => UserResolution::Mapped(login.clone()),
            None => match &self.default_assignee {
                Some(login) => UserResolution::Default(login.clone()),
                None => UserResolution::Unmapped,
            },
        }
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no explicit entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// States of the repository import state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Start,
    VerifySourceExists,
    VerifyTargetAbsent,
    CreateTarget,
    TriggerImport,
    PollImport,
    Complete,
    Failed,
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::VerifySourceExists => write!(f, "VERIFY_SOURCE_EXISTS"),
            Self::VerifyTargetAbsent => write!(f, "VERIFY_TARGET_ABSENT"),
            Self::CreateTarget => write!(f, "CREATE_TARGET"),
            Self::TriggerImport => write!(f, "TRIGGER_IMPORT"),
            Self::PollImport => write!(f, "POLL_IMPORT"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    /// Repository name on both platforms.
    pub repository: String,
    /// Every state visited, in order.
    pub transitions: Vec<ImportState>,
    /// Number of status polls issued.
    pub polls: u32,
    /// Start time of the import.
    pub started_at: DateTime<Utc>,
    /// End time of the import.
    pub completed_at: DateTime<Utc>,
}

impl ImportResult {
    /// Final state reached.
    pub fn final_state(&self) -> ImportState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(ImportState::Start)
    }
}

/// Report of a completed repository migration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Repository name.
    pub repository: String,

    /// Labels created on GitHub.
    pub labels_added: Vec<LabelDef>,

    /// Milestones created on GitHub.
    pub milestones: Vec<MilestoneMapping>,

    /// Issues created on GitHub.
    pub issues: Vec<IssueRecord>,

    /// Start time of migration.
    pub started_at: Option<DateTime<Utc>>,

    /// End time of migration.
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    /// Create a new empty report.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the migration as complete.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Total number of comments created across all issues.
    pub fn comments_migrated(&self) -> usize {
        self.issues.iter().map(|i| i.comments.len()).sum()
    }

    /// Get the duration of the migration.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Print a summary of the migration.
    pub fn print_summary(&self) {
        println!("\n=== Migration Summary: {} ===\n", self.repository);
        println!("Labels added:       {}", self.labels_added.len());
        println!("Milestones:         {}", self.milestones.len());
        println!("Issues migrated:    {}", self.issues.len());
        println!("Comments migrated:  {}", self.comments_migrated());

        if let Some(duration) = self.duration() {
            println!("\nCompleted in {} seconds", duration.num_seconds());
        }
    }
}

/// Outcome of one unit of work in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Repository the unit worked on.
    pub repository: String,
    /// Error text when the unit failed.
    pub error: Option<String>,
}

/// Best-effort results of a batch operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// One entry per attempted repository, sorted by name.
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    /// Record a successful unit.
    pub fn succeeded(&mut self, repository: impl Into<String>) {
        self.items.push(BatchItem {
            repository: repository.into(),
            error: None,
        });
    }

    /// Record a failed unit.
    pub fn failed(&mut self, repository: impl Into<String>, error: impl ToString) {
        self.items.push(BatchItem {
            repository: repository.into(),
            error: Some(error.to_string()),
        });
    }

    /// Units that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|i| i.error.is_some())
    }

    /// True when no unit failed.
    pub fn is_successful(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Print a summary of the batch.
    pub fn print_summary(&self) {
        let failed = self.failures().count();
        println!("\n=== Batch Summary ===\n");
        println!("Attempted: {}", self.items.len());
        println!("Succeeded: {}", self.items.len() - failed);
        println!("Failed:    {failed}");

        if failed > 0 {
            println!("\nErrors ({failed}):");
            for item in self.failures() {
                println!(
                    "  {}: {}",
                    item.repository,
                    item.error.as_deref().unwrap_or_default()
                );
            }
        }

        let status = if self.is_successful() {
            "SUCCESS"
        } else {
            "FAILED"
        };
        println!("\nOverall Status: {status}");
    }
}

/// Distinct GitLab authors of one project and how each maps to GitHub.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthorReport {
    /// Project name.
    pub repository: String,
    /// GitLab username to resolution, sorted by username.
    pub authors: BTreeMap<String, UserResolution>,
}
