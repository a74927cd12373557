//! Error types for migration operations.

use std::time::Duration;
use thiserror::Error;

/// Migration-specific errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// One of the repository listings could not be fetched.
    #[error("Failed to load repository directory: {source}")]
    DirectoryFetch {
        /// Underlying transport failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// No GitLab project with the given name exists.
    #[error("No project named '{repo}' found on GitLab")]
    SourceNotFound {
        /// Requested project name.
        repo: String,
    },

    /// A GitHub repository with the given name already exists.
    #[error("Repository '{repo}' already exists on GitHub")]
    TargetAlreadyExists {
        /// Requested repository name.
        repo: String,
    },

    /// The operator named a repository unknown to the target system.
    #[error("Unknown repository: {repo}")]
    UnknownRepository {
        /// Requested repository name.
        repo: String,
    },

    /// Creating one of the labels failed.
    #[error("Label sync failed for {repo}: {source}")]
    LabelSync {
        /// Repository being migrated.
        repo: String,
        /// Underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// Fetching or creating milestones failed.
    #[error("Milestone translation failed for {repo}: {source}")]
    Milestone {
        /// Repository being migrated.
        repo: String,
        /// Underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// Replicating one of the issues failed.
    #[error("Issue replication failed for {repo}: {source}")]
    IssueReplication {
        /// Repository being migrated.
        repo: String,
        /// Underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// Replicating the notes of an issue failed.
    #[error("Comment replication failed for {repo} issue #{issue}: {source}")]
    CommentReplication {
        /// Repository being migrated.
        repo: String,
        /// GitLab iid of the issue whose notes were being copied.
        issue: u64,
        /// Underlying failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// GitHub reported the import job as failed.
    #[error("Import of {repo} failed: {status_text}")]
    ImportFailed {
        /// Repository being imported.
        repo: String,
        /// Status text reported by GitHub.
        status_text: String,
    },

    /// The import job did not settle within the configured limit.
    #[error("Import of {repo} did not finish within {elapsed:?}")]
    ImportTimedOut {
        /// Repository being imported.
        repo: String,
        /// Time spent polling.
        elapsed: Duration,
    },

    /// Failed to authenticate with a remote platform.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimitExceeded(u64),

    /// API request returned a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrationError {
    /// Wraps a failure of the label step.
    pub fn label_sync(repo: impl Into<String>, source: MigrationError) -> Self {
        Self::LabelSync {
            repo: repo.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a failure of the milestone step.
    pub fn milestone(repo: impl Into<String>, source: MigrationError) -> Self {
        Self::Milestone {
            repo: repo.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a failure of the issue step.
    pub fn issue_replication(repo: impl Into<String>, source: MigrationError) -> Self {
        Self::IssueReplication {
            repo: repo.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a failure while copying the notes of one issue.
    pub fn comment_replication(repo: impl Into<String>, issue: u64, source: MigrationError) -> Self {
        Self::CommentReplication {
            repo: repo.into(),
            issue,
            source: Box::new(source),
        }
    }

    /// Returns true if the error came from the remote side rejecting a request,
    /// as opposed to a local precondition.
    pub fn is_remote(&self) -> bool {
        match self {
            Self::Api { .. }
            | Self::AuthenticationFailed(_)
            | Self::RateLimitExceeded(_)
            | Self::Network(_) => true,
            Self::DirectoryFetch { source }
            | Self::LabelSync { source, .. }
            | Self::Milestone { source, .. }
            | Self::IssueReplication { source, .. }
            | Self::CommentReplication { source, .. } => source.is_remote(),
            _ => false,
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_repository_context() {
        let err = MigrationError::label_sync(
            "widget",
            MigrationError::Api {
                status: 422,
                body: "already_exists".to_string(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("widget"));
        assert!(message.contains("422"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_comment_error_names_issue() {
        let err = MigrationError::comment_replication(
            "widget",
            7,
            MigrationError::Network("reset".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Comment replication failed for widget issue #7: Network error: reset"
        );
    }

    #[test]
    fn test_remote_classification() {
        assert!(MigrationError::RateLimitExceeded(10).is_remote());
        assert!(MigrationError::milestone("x", MigrationError::Network("down".to_string())).is_remote());
        assert!(!MigrationError::SourceNotFound {
            repo: "x".to_string()
        }
        .is_remote());
    }
}
