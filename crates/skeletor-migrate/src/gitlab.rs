//! GitLab REST client.

use crate::error::{MigrationError, Result};
use crate::types::{Platform, RemoteRepository};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Page size used for every listing.
pub const PER_PAGE: usize = 100;

/// GitLab API response types
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabProject {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub web_url: String,
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
}

impl From<GitLabProject> for RemoteRepository {
    fn from(project: GitLabProject) -> Self {
        let clone_url = project
            .http_url_to_repo
            .unwrap_or_else(|| format!("{}.git", project.web_url));
        Self {
            platform: Platform::GitLab,
            id: project.id,
            name: project.name,
            description: project.description,
            clone_url,
            web_url: project.web_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabUser {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabMilestone {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub due_date: Option<String>,
    pub state: String,
}

/// Milestone reference embedded in an issue.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabMilestoneRef {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabIssue {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub author: Option<GitLabUser>,
    #[serde(default)]
    pub assignee: Option<GitLabUser>,
    #[serde(default)]
    pub assignees: Vec<GitLabUser>,
    #[serde(default)]
    pub milestone: Option<GitLabMilestoneRef>,
}

impl GitLabIssue {
    /// The single assignee, falling back to the first of `assignees`.
    pub fn assignee_username(&self) -> Option<&str> {
        self.assignee
            .as_ref()
            .or_else(|| self.assignees.first())
            .map(|u| u.username.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabNote {
    pub id: u64,
    pub body: String,
    #[serde(default)]
    pub author: Option<GitLabUser>,
}

/// Read-only view of a GitLab instance.
#[async_trait]
pub trait GitLabApi: Send + Sync {
    /// Every project visible to the token.
    async fn list_projects(&self) -> Result<Vec<GitLabProject>>;

    /// Labels of a project.
    async fn list_labels(&self, project_id: u64) -> Result<Vec<GitLabLabel>>;

    /// Milestones of a project, in any order.
    async fn list_milestones(&self, project_id: u64) -> Result<Vec<GitLabMilestone>>;

    /// Issues of a project in every state, in any order.
    async fn list_issues(&self, project_id: u64) -> Result<Vec<GitLabIssue>>;

    /// Notes of one issue, oldest first.
    async fn list_notes(&self, project_id: u64, issue_iid: u64) -> Result<Vec<GitLabNote>>;
}

/// Client for the GitLab v4 API.
pub struct GitLabClient {
    client: Client,
    token: String,
    base_url: String,
}

impl GitLabClient {
    /// Create a new GitLab client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitLab instance URL (e.g., "https://gitlab.com")
    /// * `token` - GitLab personal access token
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("skeletor/{}", crate::VERSION))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MigrationError::Network(e.to_string()))?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/api/v4{path}", self.base_url);
        debug!(url = url.as_str(), "GitLab GET");

        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
            .map_err(|e| MigrationError::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(MigrationError::AuthenticationFailed(
                "Invalid GitLab token".to_string(),
            ));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MigrationError::Api { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MigrationError::Network(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_paginated<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let paginated_path = if path.contains('?') {
                format!("{path}&page={page}&per_page={PER_PAGE}")
            } else {
                format!("{path}?page={page}&per_page={PER_PAGE}")
            };

            let items: Vec<T> = self.get(&paginated_path).await?;

            if items.is_empty() {
                break;
            }

            let count = items.len();
            all_items.extend(items);

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(all_items)
    }
}

#[async_trait]
impl GitLabApi for GitLabClient {
    async fn list_projects(&self) -> Result<Vec<GitLabProject>> {
        self.get_paginated("/projects?membership=true&simple=true")
            .await
    }

    async fn list_labels(&self, project_id: u64) -> Result<Vec<GitLabLabel>> {
        self.get_paginated(&format!("/projects/{project_id}/labels"))
            .await
    }

    async fn list_milestones(&self, project_id: u64) -> Result<Vec<GitLabMilestone>> {
        self.get_paginated(&format!("/projects/{project_id}/milestones"))
            .await
    }

    async fn list_issues(&self, project_id: u64) -> Result<Vec<GitLabIssue>> {
        self.get_paginated(&format!("/projects/{project_id}/issues?state=all"))
            .await
    }

    async fn list_notes(&self, project_id: u64, issue_iid: u64) -> Result<Vec<GitLabNote>> {
        self.get_paginated(&format!(
            "/projects/{project_id}/issues/{issue_iid}/notes?sort=asc&order_by=created_at"
        ))
        .await
    }
}
