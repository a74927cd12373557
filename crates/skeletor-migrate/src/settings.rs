//! Static migration settings.
//!
//! The settings are plain serde data; loading them from files or the
//! environment is left to the binary.

use crate::error::{MigrationError, Result};
use crate::types::UserMapping;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default GitLab instance.
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

/// Default GitHub API root.
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Source instance.
    pub gitlab: GitLabSettings,
    /// Target organization.
    pub github: GitHubSettings,
    /// GitLab username to GitHub login.
    pub users: HashMap<String, String>,
    /// Login assigned when a GitLab assignee has no entry in `users`.
    pub default_assignee: Option<String>,
    /// Known repositories. Batch commands only touch these when non-empty.
    pub repositories: Vec<String>,
    /// Pacing and polling.
    pub migration: TuningSettings,
}

/// GitLab connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitLabSettings {
    pub url: String,
    pub token: String,
    /// Credentials handed to GitHub's importer to clone the source.
    pub username: String,
    pub password: String,
}

impl Default for GitLabSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GITLAB_URL.to_string(),
            token: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// GitHub connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub url: String,
    pub token: String,
    pub org: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GITHUB_URL.to_string(),
            token: String::new(),
            org: String::new(),
        }
    }
}

/// Delays, limits and concurrency.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TuningSettings {
    /// Pause before every GitHub write.
    pub write_delay_ms: u64,
    /// Interval between import status polls.
    pub poll_interval_ms: u64,
    /// Upper bound on import polling; 0 disables the bound.
    pub import_timeout_secs: u64,
    /// Repositories processed at once by batch commands.
    pub concurrency: usize,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            write_delay_ms: 1000,
            poll_interval_ms: 1000,
            import_timeout_secs: 3600,
            concurrency: 1,
        }
    }
}

impl TuningSettings {
    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn import_timeout(&self) -> Option<Duration> {
        (self.import_timeout_secs > 0).then(|| Duration::from_secs(self.import_timeout_secs))
    }
}

impl MigrationSettings {
    /// Check that every required value is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("gitlab.url", &self.gitlab.url),
            ("gitlab.token", &self.gitlab.token),
            ("github.url", &self.github.url),
            ("github.token", &self.github.token),
            ("github.org", &self.github.org),
        ];

        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(MigrationError::InvalidConfig(format!("{key} is required")));
        }

        for (key, value) in [("gitlab.url", &self.gitlab.url), ("github.url", &self.github.url)] {
            url::Url::parse(value)
                .map_err(|e| MigrationError::InvalidConfig(format!("{key}: {e}")))?;
        }

        if self.migration.concurrency == 0 {
            return Err(MigrationError::InvalidConfig(
                "migration.concurrency must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the username table.
    pub fn user_mapping(&self) -> UserMapping {
        UserMapping::new(self.users.clone(), self.default_assignee.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> MigrationSettings {
        let mut settings = MigrationSettings::default();
        settings.gitlab.token = "glpat-test".to_string();
        settings.github.token = "ghp_test".to_string();
        settings.github.org = "acme".to_string();
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = MigrationSettings::default();
        assert_eq!(settings.gitlab.url, DEFAULT_GITLAB_URL);
        assert_eq!(settings.github.url, DEFAULT_GITHUB_URL);
        assert_eq!(settings.migration.write_delay(), Duration::from_secs(1));
        assert_eq!(
            settings.migration.import_timeout(),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(settings.migration.concurrency, 1);
    }

    #[test]
    fn test_validate_requires_org() {
        let mut settings = valid();
        assert!(settings.validate().is_ok());

        settings.github.org = " ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("github.org"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut settings = valid();
        settings.gitlab.url = "not a url".to_string();
        assert!(matches!(
            settings.validate(),
            Err(MigrationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let tuning = TuningSettings {
            import_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(tuning.import_timeout(), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: MigrationSettings = serde_json::from_value(serde_json::json!({
            "github": { "org": "acme" },
            "users": { "jdoe": "john-doe" },
            "migration": { "write_delay_ms": 0 }
        }))
        .unwrap();

        assert_eq!(settings.github.org, "acme");
        assert_eq!(settings.github.url, DEFAULT_GITHUB_URL);
        assert_eq!(settings.migration.write_delay_ms, 0);
        assert_eq!(settings.migration.poll_interval_ms, 1000);
        assert_eq!(settings.user_mapping().len(), 1);
    }
}
