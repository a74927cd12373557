//! Repository import state machine against mocked GitLab and GitHub APIs.

mod common;

use common::*;
use serde_json::json;
use skeletor_migrate::{ImportState, MigrationError, RepositoryImporter};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn widget_source() -> serde_json::Value {
    json!({
        "id": 7,
        "name": "widget",
        "description": "A\nwidget",
        "web_url": "https://gitlab.example.com/acme/widget"
    })
}

#[tokio::test]
async fn test_import_walks_every_state() {
    let harness = Harness::start().await;
    harness
        .mount_directory(json!([widget_source()]), json!([]))
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/orgs/{ORG}/repos")))
        .respond_with(ResponseTemplate::new(201).set_body_json(github_repo(99, "widget")))
        .expect(1)
        .mount(&harness.github)
        .await;
    harness
        .mount_github(
            "PUT",
            &repo_path("widget", "/import"),
            ResponseTemplate::new(201).set_body_json(json!({ "status": "detecting" })),
        )
        .await;
    harness
        .mount_github(
            "GET",
            &repo_path("widget", "/import"),
            StatusSequence::new(vec![
                json!({ "status": "importing" }),
                json!({ "status": "importing" }),
                json!({ "status": "complete" }),
            ]),
        )
        .await;

    let ctx = harness.context();
    ctx.directory.ensure_loaded().await.unwrap();

    let result = RepositoryImporter::new(&ctx).import("widget").await.unwrap();

    assert_eq!(
        result.transitions,
        vec![
            ImportState::Start,
            ImportState::VerifySourceExists,
            ImportState::VerifyTargetAbsent,
            ImportState::CreateTarget,
            ImportState::TriggerImport,
            ImportState::PollImport,
            ImportState::Complete,
        ]
    );
    assert_eq!(result.final_state(), ImportState::Complete);
    assert_eq!(result.polls, 3);

    let created = harness
        .github_bodies("POST", &format!("/orgs/{ORG}/repos"))
        .await;
    assert_eq!(
        created,
        vec![json!({ "name": "widget", "private": true, "description": "A widget" })]
    );

    let trigger = harness
        .github_bodies("PUT", &repo_path("widget", "/import"))
        .await;
    assert_eq!(
        trigger,
        vec![json!({
            "vcs_url": "https://gitlab.example.com/acme/widget",
            "vcs": "git",
            "vcs_username": "gitlab-bot",
            "vcs_password": "hunter2"
        })]
    );
}

#[tokio::test]
async fn test_import_error_status_fails_run() {
    let harness = Harness::start().await;
    harness
        .mount_directory(json!([widget_source()]), json!([]))
        .await;
    harness
        .mount_github(
            "POST",
            &format!("/orgs/{ORG}/repos"),
            ResponseTemplate::new(201).set_body_json(github_repo(99, "widget")),
        )
        .await;
    harness
        .mount_github(
            "PUT",
            &repo_path("widget", "/import"),
            ResponseTemplate::new(201).set_body_json(json!({ "status": "detecting" })),
        )
        .await;
    harness
        .mount_github(
            "GET",
            &repo_path("widget", "/import"),
            StatusSequence::new(vec![
                json!({ "status": "importing" }),
                json!({ "status": "error", "status_text": "auth failed" }),
            ]),
        )
        .await;

    let ctx = harness.context();
    ctx.directory.ensure_loaded().await.unwrap();

    let err = RepositoryImporter::new(&ctx)
        .import("widget")
        .await
        .unwrap_err();
    match err {
        MigrationError::ImportFailed { repo, status_text } => {
            assert_eq!(repo, "widget");
            assert_eq!(status_text, "auth failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_existing_target_is_never_overwritten() {
    let harness = Harness::start().await;
    harness
        .mount_directory(json!([widget_source()]), json!([github_repo(3, "widget")]))
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&harness.github)
        .await;

    let ctx = harness.context();
    ctx.directory.ensure_loaded().await.unwrap();

    let err = RepositoryImporter::new(&ctx)
        .import("widget")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::TargetAlreadyExists { .. }));
}

#[tokio::test]
async fn test_missing_source_is_rejected() {
    let harness = Harness::start().await;
    harness.mount_directory(json!([]), json!([])).await;

    let ctx = harness.context();
    ctx.directory.ensure_loaded().await.unwrap();

    let err = RepositoryImporter::new(&ctx)
        .import("ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::SourceNotFound { repo } if repo == "ghost"));

    // Only the two listings were fetched.
    assert_eq!(harness.github_calls().await.len(), 1);
    assert_eq!(harness.gitlab_calls().await.len(), 1);
}

#[tokio::test]
async fn test_stuck_import_times_out() {
    let harness = Harness::start().await;
    harness
        .mount_directory(json!([widget_source()]), json!([]))
        .await;
    harness
        .mount_github(
            "POST",
            &format!("/orgs/{ORG}/repos"),
            ResponseTemplate::new(201).set_body_json(github_repo(99, "widget")),
        )
        .await;
    harness
        .mount_github(
            "PUT",
            &repo_path("widget", "/import"),
            ResponseTemplate::new(201).set_body_json(json!({ "status": "detecting" })),
        )
        .await;
    harness
        .mount_github(
            "GET",
            &repo_path("widget", "/import"),
            ResponseTemplate::new(200).set_body_json(json!({ "status": "importing" })),
        )
        .await;

    let mut options = harness.context().import.clone();
    options.timeout = Some(Duration::from_millis(30));
    let ctx = harness.context().with_import_options(options);
    ctx.directory.ensure_loaded().await.unwrap();

    let err = RepositoryImporter::new(&ctx)
        .import("widget")
        .await
        .unwrap_err();
    match err {
        MigrationError::ImportTimedOut { repo, elapsed } => {
            assert_eq!(repo, "widget");
            assert!(elapsed >= Duration::from_millis(30));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
