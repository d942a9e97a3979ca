//! Management API client
//!
//! Every operation is a single JSON POST to `{base}/{endpoint}`. Calls made
//! inside a session carry the session id in the `X-chkp-sid` header. Non-success
//! responses are unwrapped into [`AppError::Api`] using the server's structured
//! error body when one is present.

use crate::config::ServerConfig;
use crate::domain::TrackSpec;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::types::*;
use super::{ManagementApi, Session};

pub const SESSION_HEADER: &str = "X-chkp-sid";

/// Management API client
#[derive(Clone)]
pub struct ManagementClient {
    base_url: Url,
    http_client: Client,
}

impl ManagementClient {
    /// Create a new client for the configured server
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let http_client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Base URL endpoints are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| AppError::Config(format!("Invalid endpoint '{}': {}", endpoint, e)))
    }

    /// POST `body` to `endpoint` and return the response once its status is
    /// known to be a success.
    async fn post<B: Serialize + ?Sized>(
        &self,
        session: Option<&Session>,
        endpoint: &str,
        body: &B,
    ) -> Result<Response> {
        let url = self.endpoint_url(endpoint)?;
        debug!(endpoint, "calling management API");

        let mut request = self.http_client.post(url).json(body);
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session.sid());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("{}: {}", endpoint, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.best_message())
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(AppError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn call<B, T>(&self, session: Option<&Session>, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(session, endpoint, body).await?;
        response.json::<T>().await.map_err(|e| {
            AppError::InvalidResponse(format!("Failed to parse {} response: {}", endpoint, e))
        })
    }

    /// Call an endpoint whose success body carries nothing we need.
    async fn call_unit<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        endpoint: &str,
        body: &B,
    ) -> Result<()> {
        self.post(Some(session), endpoint, body).await?;
        Ok(())
    }
}

#[async_trait]
impl ManagementApi for ManagementClient {
    async fn login(&self, user: &str, password: &str) -> Result<Session> {
        let response: LoginResponse = self
            .call(None, "login", &LoginRequest { user, password })
            .await?;

        debug!(
            session_timeout = ?response.session_timeout,
            api_server_version = ?response.api_server_version,
            "logged in"
        );
        Ok(Session::new(response.sid))
    }

    async fn logout(&self, session: &Session) -> Result<()> {
        self.call_unit(session, "logout", &EmptyRequest {}).await
    }

    async fn discard(&self, session: &Session) -> Result<()> {
        self.call_unit(session, "discard", &EmptyRequest {}).await
    }

    async fn show_packages(&self, session: &Session) -> Result<Vec<PolicyPackage>> {
        let response: ShowPackagesResponse = self
            .call(
                Some(session),
                "show-packages",
                &ShowPackagesRequest {
                    details_level: DETAILS_LEVEL_FULL,
                },
            )
            .await?;
        Ok(response.packages)
    }

    async fn show_package(&self, session: &Session, name: &str) -> Result<Vec<AccessLayer>> {
        let response: ShowPackageResponse = self
            .call(
                Some(session),
                "show-package",
                &ShowPackageRequest {
                    name,
                    details_level: DETAILS_LEVEL_FULL,
                },
            )
            .await?;
        Ok(response.access_layers)
    }

    async fn show_access_rulebase(&self, session: &Session, layer: &str) -> Result<RulebasePage> {
        self.call(
            Some(session),
            "show-access-rulebase",
            &ShowRulebaseRequest {
                name: layer,
                details_level: DETAILS_LEVEL_FULL,
                use_object_dictionary: true,
            },
        )
        .await
    }

    async fn set_access_rule(
        &self,
        session: &Session,
        layer: &str,
        uid: &str,
        track: &TrackSpec,
    ) -> Result<()> {
        let request = SetAccessRuleRequest {
            layer,
            uid,
            track: TrackPayload {
                track_type: track.track_type.as_str(),
                accounting: track.accounting,
                per_connection: track.per_connection,
                per_session: track.per_session,
            },
        };
        self.call_unit(session, "set-access-rule", &request).await
    }

    async fn publish(&self, session: &Session) -> Result<Option<String>> {
        let response: PublishResponse = self
            .call(Some(session), "publish", &EmptyRequest {})
            .await?;
        Ok(response.task_id)
    }

    async fn show_task(&self, session: &Session, task_id: &str) -> Result<TaskStatus> {
        let response: ShowTaskResponse = self
            .call(
                Some(session),
                "show-task",
                &ShowTaskRequest {
                    task_id,
                    details_level: DETAILS_LEVEL_FULL,
                },
            )
            .await?;

        response
            .tasks
            .into_iter()
            .next()
            .map(TaskStatus::from)
            .ok_or_else(|| {
                AppError::InvalidResponse(format!("show-task returned no task for '{}'", task_id))
            })
    }
}
