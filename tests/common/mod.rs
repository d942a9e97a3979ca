//! Common test utilities

#![allow(dead_code)]

use rule_track::config::{PollConfig, ServerConfig};
use rule_track::mgmt::ManagementClient;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SID: &str = "test-sid-0001";

pub fn server_config(uri: &str) -> ServerConfig {
    ServerConfig {
        address: Some(uri.to_string()),
        timeout_secs: 5,
        ..Default::default()
    }
}

pub fn create_test_client(mock_server: &MockServer) -> ManagementClient {
    ManagementClient::new(&server_config(&mock_server.uri())).unwrap()
}

pub fn fast_poll() -> PollConfig {
    PollConfig {
        interval: Duration::ZERO,
        max_attempts: 3,
    }
}

/// Mount a successful, session-bound response for `endpoint`.
pub async fn mount_ok(mock_server: &MockServer, endpoint: &str, body: Value, calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/web_api/{}", endpoint)))
        .and(header("X-chkp-sid", SID))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(mock_server)
        .await;
}

pub async fn mount_login(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/web_api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sid": SID,
            "session-timeout": 600,
            "api-server-version": "1.8"
        })))
        .expect(1)
        .mount(mock_server)
        .await;
}

/// Three rules, the second inside a section, tracks in each supported shape.
pub fn sample_rulebase() -> Value {
    json!({
        "from": 1,
        "to": 3,
        "total": 3,
        "rulebase": [
            {
                "type": "access-rule",
                "uid": "rule-1",
                "name": "Allow DNS",
                "track": { "type": "trk-log", "accounting": false, "per-connection": true }
            },
            {
                "type": "access-section",
                "name": "Web",
                "rulebase": [
                    {
                        "type": "access-rule",
                        "uid": "rule-2",
                        "name": "Allow HTTPS",
                        "track": { "type": { "uid": "trk-none", "name": "None" } }
                    }
                ]
            },
            {
                "type": "access-rule",
                "uid": "rule-3",
                "name": "Cleanup rule",
                "track": "trk-none"
            }
        ],
        "objects-dictionary": [
            { "uid": "trk-log", "name": "Log", "type": "Track" },
            { "uid": "trk-none", "name": "None", "type": "Track" }
        ]
    })
}
