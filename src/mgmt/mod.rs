//! Firewall management API
//!
//! [`ManagementApi`] is the seam the workflow talks to; [`ManagementClient`]
//! implements it over HTTPS.

pub mod client;
pub mod types;

use crate::domain::TrackSpec;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

pub use client::ManagementClient;
pub use types::{AccessLayer, PolicyPackage, RulebasePage, TaskStatus};

/// Authenticated editing session. Holding one implies holding the server-side
/// locks on every object changed through it.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    sid: String,
}

impl Session {
    pub fn new(sid: impl Into<String>) -> Self {
        Self { sid: sid.into() }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// One operation per management endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn login(&self, user: &str, password: &str) -> Result<Session>;
    async fn logout(&self, session: &Session) -> Result<()>;
    /// Drop every pending change of the session and release its locks.
    async fn discard(&self, session: &Session) -> Result<()>;
    async fn show_packages(&self, session: &Session) -> Result<Vec<PolicyPackage>>;
    /// Access layers of the named package.
    async fn show_package(&self, session: &Session, name: &str) -> Result<Vec<AccessLayer>>;
    async fn show_access_rulebase(&self, session: &Session, layer: &str) -> Result<RulebasePage>;
    async fn set_access_rule(
        &self,
        session: &Session,
        layer: &str,
        uid: &str,
        track: &TrackSpec,
    ) -> Result<()>;
    /// Submit pending changes. Returns the id of the asynchronous publish
    /// task when the server reports one.
    async fn publish(&self, session: &Session) -> Result<Option<String>>;
    async fn show_task(&self, session: &Session, task_id: &str) -> Result<TaskStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_hides_sid() {
        let session = Session::new("secret-sid");
        assert_eq!(session.sid(), "secret-sid");
        assert!(!format!("{:?}", session).contains("secret-sid"));
    }
}
