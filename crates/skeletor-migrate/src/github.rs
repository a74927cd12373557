//! GitHub REST client scoped to one organization.

use crate::error::{MigrationError, Result};
use crate::types::{IssueState, Platform, RemoteRepository};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default media type.
pub const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Media type unlocking the source import endpoints.
pub const ACCEPT_IMPORT_PREVIEW: &str = "application/vnd.github.barred-rock-preview";

const PER_PAGE: usize = 100;

/// GitHub API response types
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub html_url: String,
}

impl From<GitHubRepo> for RemoteRepository {
    fn from(repo: GitHubRepo) -> Self {
        Self {
            platform: Platform::GitHub,
            id: repo.id,
            name: repo.name,
            description: repo.description,
            clone_url: repo.clone_url,
            web_url: repo.html_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubMilestone {
    pub number: u64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub state: IssueState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubComment {
    pub id: u64,
}

/// Status of a source import job.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportStatus {
    pub status: String,
    #[serde(default)]
    pub status_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub private: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartImportRequest {
    pub vcs_url: String,
    pub vcs: String,
    pub vcs_username: String,
    pub vcs_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateLabelRequest {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMilestoneRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub state: IssueState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

#[derive(Debug, Serialize)]
struct UpdateIssueRequest {
    state: IssueState,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

/// Operations on the target organization.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Every repository of the organization.
    async fn list_repos(&self) -> Result<Vec<GitHubRepo>>;

    async fn create_repo(&self, request: &CreateRepoRequest) -> Result<GitHubRepo>;

    async fn delete_repo(&self, repo: &str) -> Result<()>;

    /// Start a source import into an existing, empty repository.
    async fn start_import(&self, repo: &str, request: &StartImportRequest) -> Result<ImportStatus>;

    async fn import_status(&self, repo: &str) -> Result<ImportStatus>;

    async fn list_labels(&self, repo: &str) -> Result<Vec<GitHubLabel>>;

    async fn create_label(&self, repo: &str, request: &CreateLabelRequest) -> Result<GitHubLabel>;

    async fn create_milestone(
        &self,
        repo: &str,
        request: &CreateMilestoneRequest,
    ) -> Result<GitHubMilestone>;

    async fn create_issue(&self, repo: &str, request: &CreateIssueRequest) -> Result<GitHubIssue>;

    async fn update_issue_state(
        &self,
        repo: &str,
        number: u64,
        state: IssueState,
    ) -> Result<GitHubIssue>;

    async fn create_comment(&self, repo: &str, number: u64, body: &str) -> Result<GitHubComment>;
}

/// Client for the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    token: String,
    base_url: String,
    org: String,
}

impl GitHubClient {
    /// Create a new GitHub client for `org`.
    pub fn new(base_url: &str, token: &str, org: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("skeletor/{}", crate::VERSION))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MigrationError::Network(e.to_string()))?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            org: org.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, accept: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(method = method.as_str(), url = url.as_str(), "GitHub request");
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", accept)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MigrationError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(MigrationError::AuthenticationFailed(
                "Invalid GitHub token".to_string(),
            ));
        }

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(wait) = rate_limit_wait(&response) {
                return Err(MigrationError::RateLimitExceeded(wait));
            }
        }

        let body = response.text().await.unwrap_or_default();
        Err(MigrationError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
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
            let url = format!("{path}?page={page}&per_page={PER_PAGE}");
            let items: Vec<T> = self
                .execute(self.request(Method::GET, &url, ACCEPT_JSON))
                .await?;

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

    fn repo_path(&self, repo: &str) -> String {
        format!("/repos/{}/{repo}", self.org)
    }
}

/// Seconds until the rate limit window resets, if the response says the
/// limit is exhausted.
fn rate_limit_wait(response: &Response) -> Option<u64> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
    };

    if let Some(retry_after) = header("retry-after") {
        return Some(retry_after.max(0) as u64);
    }

    if header("x-ratelimit-remaining") != Some(0) {
        return None;
    }

    let reset = header("x-ratelimit-reset")?;
    Some((reset - chrono::Utc::now().timestamp()).max(0) as u64)
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_repos(&self) -> Result<Vec<GitHubRepo>> {
        self.get_paginated(&format!("/orgs/{}/repos", self.org))
            .await
    }

    async fn create_repo(&self, request: &CreateRepoRequest) -> Result<GitHubRepo> {
        let path = format!("/orgs/{}/repos", self.org);
        self.execute(self.request(Method::POST, &path, ACCEPT_JSON).json(request))
            .await
    }

    async fn delete_repo(&self, repo: &str) -> Result<()> {
        let path = self.repo_path(repo);
        self.send(self.request(Method::DELETE, &path, ACCEPT_JSON))
            .await?;
        Ok(())
    }

    async fn start_import(&self, repo: &str, request: &StartImportRequest) -> Result<ImportStatus> {
        let path = format!("{}/import", self.repo_path(repo));
        self.execute(
            self.request(Method::PUT, &path, ACCEPT_IMPORT_PREVIEW)
                .json(request),
        )
        .await
    }

    async fn import_status(&self, repo: &str) -> Result<ImportStatus> {
        let path = format!("{}/import", self.repo_path(repo));
        self.execute(self.request(Method::GET, &path, ACCEPT_IMPORT_PREVIEW))
            .await
    }

    async fn list_labels(&self, repo: &str) -> Result<Vec<GitHubLabel>> {
        self.get_paginated(&format!("{}/labels", self.repo_path(repo)))
            .await
    }

    async fn create_label(&self, repo: &str, request: &CreateLabelRequest) -> Result<GitHubLabel> {
        let path = format!("{}/labels", self.repo_path(repo));
        self.execute(self.request(Method::POST, &path, ACCEPT_JSON).json(request))
            .await
    }

    async fn create_milestone(
        &self,
        repo: &str,
        request: &CreateMilestoneRequest,
    ) -> Result<GitHubMilestone> {
        let path = format!("{}/milestones", self.repo_path(repo));
        self.execute(self.request(Method::POST, &path, ACCEPT_JSON).json(request))
            .await
    }

    async fn create_issue(&self, repo: &str, request: &CreateIssueRequest) -> Result<GitHubIssue> {
        let path = format!("{}/issues", self.repo_path(repo));
        self.execute(self.request(Method::POST, &path, ACCEPT_JSON).json(request))
            .await
    }

    async fn update_issue_state(
        &self,
        repo: &str,
        number: u64,
        state: IssueState,
    ) -> Result<GitHubIssue> {
        let path = format!("{}/issues/{number}", self.repo_path(repo));
        self.execute(
            self.request(Method::PATCH, &path, ACCEPT_JSON)
                .json(&UpdateIssueRequest { state }),
        )
        .await
    }

    async fn create_comment(&self, repo: &str, number: u64, body: &str) -> Result<GitHubComment> {
        let path = format!("{}/issues/{number}/comments", self.repo_path(repo));
        self.execute(
            self.request(Method::POST, &path, ACCEPT_JSON)
                .json(&CreateCommentRequest { body }),
        )
        .await
    }
}
