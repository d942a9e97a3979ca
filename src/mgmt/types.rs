//! Management API type definitions
//!
//! Request and response bodies for the management endpoints. Field names
//! follow the server's kebab-case JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DETAILS_LEVEL_FULL: &str = "full";

// ============================================================================
// Session
// ============================================================================

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoginResponse {
    pub sid: String,
    #[serde(default)]
    pub session_timeout: Option<u64>,
    #[serde(default)]
    pub api_server_version: Option<String>,
}

/// Body for endpoints that take no arguments (`logout`, `discard`, `publish`).
#[derive(Serialize)]
pub struct EmptyRequest {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishResponse {
    #[serde(default)]
    pub task_id: Option<String>,
}

// ============================================================================
// Packages and layers
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowPackagesRequest {
    pub details_level: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowPackageRequest<'a> {
    pub name: &'a str,
    pub details_level: &'static str,
}

/// Named object as listed by the server (package, layer, dictionary entry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedObject {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyPackage {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessLayer {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShowPackagesResponse {
    #[serde(default)]
    pub packages: Vec<PolicyPackage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowPackageResponse {
    #[serde(default)]
    pub access_layers: Vec<AccessLayer>,
}

// ============================================================================
// Rulebase
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowRulebaseRequest<'a> {
    pub name: &'a str,
    pub details_level: &'static str,
    pub use_object_dictionary: bool,
}

/// One page of `show-access-rulebase` output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RulebasePage {
    #[serde(default)]
    pub rulebase: Vec<RulebaseEntry>,
    #[serde(default)]
    pub objects_dictionary: Vec<NamedObject>,
    /// Last position covered by this page
    #[serde(default)]
    pub to: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl RulebasePage {
    /// Total rule count when the server holds more than this page covers.
    pub fn truncated_total(&self) -> Option<u64> {
        match (self.to, self.total) {
            (Some(to), Some(total)) if total > to => Some(total),
            _ => None,
        }
    }
}

/// Rule or section. Sections carry their rules in `rulebase`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulebaseEntry {
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub track: Option<TrackField>,
    #[serde(default)]
    pub rulebase: Vec<RulebaseEntry>,
}

pub const ENTRY_ACCESS_RULE: &str = "access-rule";
pub const ENTRY_ACCESS_SECTION: &str = "access-section";

/// A rule's `track` value as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TrackField {
    Reference(String),
    Object(TrackObject),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrackObject {
    #[serde(rename = "type", default)]
    pub track_type: Option<TrackTypeField>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub accounting: Option<bool>,
    #[serde(default)]
    pub per_connection: Option<bool>,
    #[serde(default)]
    pub per_session: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TrackTypeField {
    Reference(String),
    Inline(NamedObject),
}

// ============================================================================
// Rule mutation
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SetAccessRuleRequest<'a> {
    pub layer: &'a str,
    pub uid: &'a str,
    pub track: TrackPayload<'a>,
}

/// All three flags are always sent; the server decides whether they apply.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrackPayload<'a> {
    #[serde(rename = "type")]
    pub track_type: &'a str,
    pub accounting: bool,
    pub per_connection: bool,
    pub per_session: bool,
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShowTaskRequest<'a> {
    pub task_id: &'a str,
    pub details_level: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShowTaskResponse {
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskEntry {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress_percentage: Option<u32>,
    #[serde(default)]
    pub task_details: Vec<Value>,
}

/// Snapshot of an asynchronous server task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub status: String,
    pub progress: u32,
    pub details: Vec<String>,
}

impl From<TaskEntry> for TaskStatus {
    fn from(entry: TaskEntry) -> Self {
        Self {
            status: entry.status,
            progress: entry.progress_percentage.unwrap_or(0),
            details: entry.task_details.iter().map(detail_line).collect(),
        }
    }
}

/// Render one `task-details` entry as a readable line.
fn detail_line(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["message", "statusDescription", "fault-message", "comments"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| detail.to_string()),
        other => other.to_string(),
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Structured error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorItem {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// First error item's message, then the top-level message.
    pub fn best_message(&self) -> Option<String> {
        self.errors
            .first()
            .and_then(|e| e.message.clone())
            .or_else(|| self.message.clone())
            .filter(|m| !m.trim().is_empty())
    }
}
