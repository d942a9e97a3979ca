//! End-to-end workflow runs against a mock management server

mod common;

use common::{create_test_client, fast_poll, mount_login, mount_ok, sample_rulebase};
use pretty_assertions::assert_eq;
use rule_track::config::Credentials;
use rule_track::console::Console;
use rule_track::domain::RuleSelection;
use rule_track::error::AppError;
use rule_track::prompt::LinePrompter;
use rule_track::service::workflow::{Resolution, ResolvedAs};
use rule_track::service::{
    PublishPolicy, PublishWorkflow, RunOutcome, RunRequest, TrackRequest, WorkflowState,
};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestPrompter = LinePrompter<Cursor<Vec<u8>>, Vec<u8>>;

fn prompter(input: &str) -> TestPrompter {
    LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn request(track_type: &str) -> RunRequest {
    RunRequest {
        credentials: Credentials {
            user: Some("admin".to_string()),
            password: Some("secret".to_string()),
        },
        package: Some("Standard".to_string()),
        layer: None,
        selection: Some(RuleSelection::All),
        track: Some(TrackRequest {
            track_type: track_type.to_string(),
            accounting: false,
            per_connection: false,
            per_session: false,
        }),
        publish: PublishPolicy::Never,
        interactive: false,
    }
}

/// Login, one package with one layer, and the sample rulebase.
async fn mount_policy(mock_server: &MockServer) {
    mount_login(mock_server).await;
    mount_ok(
        mock_server,
        "show-packages",
        json!({ "packages": [{ "name": "Standard" }] }),
        1,
    )
    .await;
    mount_ok(
        mock_server,
        "show-package",
        json!({ "access-layers": [{ "name": "Network" }] }),
        1,
    )
    .await;
    mount_ok(mock_server, "show-access-rulebase", sample_rulebase(), 1).await;
}

fn workflow(
    mock_server: &MockServer,
    input: &str,
) -> PublishWorkflow<rule_track::mgmt::ManagementClient, TestPrompter> {
    PublishWorkflow::new(
        Arc::new(create_test_client(mock_server)),
        prompter(input),
        Console::silent(),
        fast_poll(),
    )
}

#[tokio::test]
async fn test_unattended_run_publishes() {
    let mock_server = MockServer::start().await;
    mount_policy(&mock_server).await;
    mount_ok(&mock_server, "set-access-rule", json!({}), 3).await;
    // Stale-change cleanup only
    mount_ok(&mock_server, "discard", json!({}), 1).await;
    mount_ok(&mock_server, "publish", json!({ "task-id": "task-1" }), 1).await;
    Mock::given(method("POST"))
        .and(path("/web_api/show-task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [{ "status": "in progress", "progress-percentage": 40 }]
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_ok(
        &mock_server,
        "show-task",
        json!({ "tasks": [{ "status": "succeeded", "progress-percentage": 100 }] }),
        1,
    )
    .await;
    mount_ok(&mock_server, "logout", json!({ "message": "OK" }), 1).await;

    let mut wf = workflow(&mock_server, "");
    let mut req = request("log");
    req.publish = PublishPolicy::Always;
    let outcome = wf.run(req).await.unwrap();

    assert_eq!(outcome.exit_code(false), 0);
    let RunOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.success_count(), 3);
    match report.resolution {
        Resolution::Published(Some(task)) => assert_eq!(task.polls, 2),
        other => panic!("unexpected resolution: {:?}", other),
    }
    assert_eq!(
        wf.history(),
        &[
            WorkflowState::Authenticating,
            WorkflowState::PackageSelected,
            WorkflowState::LayerSelected,
            WorkflowState::RulesFetched,
            WorkflowState::RulesSelected,
            WorkflowState::ConfigGathering,
            WorkflowState::ConfigValidating,
            WorkflowState::ConfigApplied,
            WorkflowState::Summarized,
            WorkflowState::Resolved(ResolvedAs::Published),
            WorkflowState::LoggedOut,
        ]
    );
}

#[tokio::test]
async fn test_rejected_first_rule_aborts_and_cleans_up() {
    let mock_server = MockServer::start().await;
    mount_policy(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/web_api/set-access-rule"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "generic_err_invalid_parameter",
            "message": "Extended Log requires the Content Awareness blade"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_ok(&mock_server, "discard", json!({}), 2).await;
    mount_ok(&mock_server, "logout", json!({}), 1).await;

    let mut wf = workflow(&mock_server, "");
    let result = wf.run(request("extended")).await;

    match result {
        Err(AppError::Validation(message)) => {
            assert!(message.contains("Content Awareness"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(wf.state(), WorkflowState::LoggedOut);
}

#[tokio::test]
async fn test_interactive_run_discards_when_declined() {
    let mock_server = MockServer::start().await;
    mount_policy(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/web_api/set-access-rule"))
        .and(body_partial_json(json!({ "track": { "type": "log", "per-connection": true } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_ok(&mock_server, "discard", json!({}), 2).await;
    mount_ok(&mock_server, "logout", json!({}), 1).await;

    // Rules, track type, accounting, per-connection, per-session, publish.
    let input = "1,3,9\nlog\nn\ny\n\nn\n";
    let mut wf = workflow(&mock_server, input);
    let mut req = request("log");
    req.selection = None;
    req.track = None;
    req.interactive = true;
    req.publish = PublishPolicy::Confirm;
    let outcome = wf.run(req).await.unwrap();

    let RunOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    let positions: Vec<_> = report.changes.iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![1, 3]);
    assert_eq!(report.resolution, Resolution::Discarded);
    assert_eq!(report.changes[1].before, "None");
    assert_eq!(report.changes[1].after, "log (per-connection)");
}

#[tokio::test]
async fn test_login_failure_makes_no_further_calls() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/web_api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Wrong username or password"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut wf = workflow(&mock_server, "");
    let err = wf.run(request("log")).await.unwrap_err();

    assert_eq!(err.server_message(), "Wrong username or password");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}
