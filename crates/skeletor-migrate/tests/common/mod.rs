//! Shared wiremock harness: one mock server per platform.
#![allow(dead_code)]

use serde_json::{json, Value};
use skeletor_migrate::{
    GitHubClient, GitLabClient, ImportOptions, MigrationContext, Pacer, RemoteRepository,
    UserMapping,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const ORG: &str = "acme";

pub struct Harness {
    pub gitlab: MockServer,
    pub github: MockServer,
}

impl Harness {
    pub async fn start() -> Self {
        Self {
            gitlab: MockServer::start().await,
            github: MockServer::start().await,
        }
    }

    pub fn context(&self) -> MigrationContext {
        let gitlab = GitLabClient::new(&self.gitlab.uri(), "glpat-test").unwrap();
        let github = GitHubClient::new(&self.github.uri(), "ghp_test", ORG).unwrap();

        MigrationContext::new(Arc::new(gitlab), Arc::new(github))
            .with_pacer(Pacer::disabled())
            .with_users(UserMapping::default())
            .with_import_options(ImportOptions {
                vcs_username: "gitlab-bot".to_string(),
                vcs_password: "hunter2".to_string(),
                poll_interval: Duration::from_millis(5),
                timeout: Some(Duration::from_secs(5)),
            })
    }

    /// Serve both repository listings.
    pub async fn mount_directory(&self, gitlab_projects: Value, github_repos: Value) {
        Mock::given(method("GET"))
            .and(path("/api/v4/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gitlab_projects))
            .mount(&self.gitlab)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/orgs/{ORG}/repos")))
            .respond_with(ResponseTemplate::new(200).set_body_json(github_repos))
            .mount(&self.github)
            .await;
    }

    pub async fn mount_gitlab_list(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v4{route}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.gitlab)
            .await;
    }

    pub async fn mount_github(&self, verb: &str, route: &str, responder: impl Respond + 'static) {
        Mock::given(method(verb))
            .and(path(route.to_string()))
            .respond_with(responder)
            .mount(&self.github)
            .await;
    }

    /// JSON bodies of every GitHub request with this method and path, in
    /// arrival order.
    pub async fn github_bodies(&self, verb: &str, route: &str) -> Vec<Value> {
        self.github
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == verb && r.url.path() == route)
            .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
            .collect()
    }

    /// Method and path of every GitHub request, in arrival order.
    pub async fn github_calls(&self) -> Vec<String> {
        self.github
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }

    pub async fn gitlab_calls(&self) -> Vec<String> {
        self.gitlab
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }
}

pub fn gitlab_project(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} project"),
        "web_url": format!("https://gitlab.example.com/acme/{name}"),
        "http_url_to_repo": format!("https://gitlab.example.com/acme/{name}.git")
    })
}

pub fn github_repo(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "clone_url": format!("https://github.com/{ORG}/{name}.git"),
        "html_url": format!("https://github.com/{ORG}/{name}")
    })
}

pub fn repo_path(name: &str, rest: &str) -> String {
    format!("/repos/{ORG}/{name}{rest}")
}

pub fn remote(ctx: &MigrationContext, platform: skeletor_migrate::Platform, name: &str) -> RemoteRepository {
    ctx.directory
        .find_by_name(platform, name)
        .cloned()
        .unwrap_or_else(|| panic!("{name} missing from {platform} listing"))
}

/// Answers every call with `{"number": n, "id": n}` where `n` counts up
/// from 1, echoing the `title` and `state` of the request body.
#[derive(Default)]
pub struct Numbered {
    next: AtomicUsize,
}

impl Respond for Numbered {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        ResponseTemplate::new(201).set_body_json(json!({
            "id": n,
            "number": n,
            "title": body.get("title").cloned().unwrap_or(Value::Null),
            "name": body.get("name").cloned().unwrap_or(Value::Null),
            "state": "open"
        }))
    }
}

/// Echoes the issue state sent in a PATCH body.
pub fn echo_state(number: u64) -> impl Respond {
    move |request: &Request| {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(json!({
            "number": number,
            "state": body["state"]
        }))
    }
}

/// Plays back a fixed list of import statuses, repeating the last one.
pub struct StatusSequence {
    statuses: Mutex<Vec<Value>>,
}

impl StatusSequence {
    pub fn new(statuses: Vec<Value>) -> Self {
        let mut statuses = statuses;
        statuses.reverse();
        Self {
            statuses: Mutex::new(statuses),
        }
    }
}

impl Respond for StatusSequence {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop().unwrap_or(Value::Null)
        } else {
            statuses.last().cloned().unwrap_or(Value::Null)
        };
        ResponseTemplate::new(200).set_body_json(status)
    }
}
