//! Configuration management for Rule Track

use crate::error::AppError;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Management server connection
    pub server: ServerConfig,
    /// Login credentials
    pub credentials: Credentials,
    /// Publish task polling
    pub poll: PollConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
    /// Operator console configuration
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host`, `host:port` or a full `https://` URL
    pub address: Option<String>,
    /// Overrides any port given in `address`
    pub port: Option<u16>,
    /// Path prefix of the management API (e.g. `web_api`)
    pub api_path: String,
    /// Management servers usually present self-signed certificates, so
    /// validation is off unless explicitly requested.
    pub verify_tls: bool,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: None,
            api_path: "web_api".to_string(),
            verify_tls: false,
            timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Base URL every endpoint name is joined onto.
    pub fn base_url(&self) -> crate::error::Result<Url> {
        let address = self
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::MissingParameter("server address".to_string()))?;

        let raw = if address.contains("://") {
            address.to_string()
        } else {
            format!("https://{}", address)
        };

        let mut url = Url::parse(&raw).map_err(|e| {
            AppError::Config(format!("Invalid server address '{}': {}", address, e))
        })?;
        if url.host_str().is_none() {
            return Err(AppError::Config(format!(
                "Invalid server address '{}': missing host",
                address
            )));
        }
        if let Some(port) = self.port {
            url.set_port(Some(port)).map_err(|_| {
                AppError::Config(format!("Cannot set port {} on '{}'", port, address))
            })?;
        }

        url.set_path(&format!("{}/", self.api_path.trim_matches('/')));
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Login credentials. Never persisted, never logged.
#[derive(Clone, Default)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
    /// Raise the default filter to debug
    pub verbose: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub quiet: bool,
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                address: env::var("MGMT_SERVER").ok(),
                port: env::var("MGMT_PORT")
                    .ok()
                    .map(|p| p.parse())
                    .transpose()
                    .context("Invalid MGMT_PORT")?,
                api_path: env::var("MGMT_API_PATH").unwrap_or_else(|_| "web_api".to_string()),
                verify_tls: env::var("MGMT_VERIFY_TLS")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(false),
                timeout_secs: env::var("MGMT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid MGMT_TIMEOUT_SECS")?,
            },
            credentials: Credentials {
                user: env::var("MGMT_USER").ok(),
                password: env::var("MGMT_PASSWORD").ok(),
            },
            poll: PollConfig::default(),
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                verbose: false,
            },
            output: OutputConfig {
                quiet: false,
                color: env::var_os("NO_COLOR").is_none(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(address: &str) -> ServerConfig {
        ServerConfig {
            address: Some(address.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_base_url_from_host() {
        let url = server("mgmt.example.com").base_url().unwrap();
        assert_eq!(url.as_str(), "https://mgmt.example.com/web_api/");
    }

    #[test]
    fn test_base_url_host_and_port() {
        let url = server("10.0.0.5:4434").base_url().unwrap();
        assert_eq!(url.as_str(), "https://10.0.0.5:4434/web_api/");
    }

    #[test]
    fn test_base_url_explicit_port_overrides() {
        let mut config = server("https://mgmt.example.com:443");
        config.port = Some(8443);
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "https://mgmt.example.com:8443/web_api/");
    }

    #[test]
    fn test_base_url_keeps_scheme() {
        let url = server("http://127.0.0.1:9000").base_url().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/web_api/");
    }

    #[test]
    fn test_base_url_custom_api_path() {
        let mut config = server("mgmt");
        config.api_path = "/api/v2/".to_string();
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str(), "https://mgmt/api/v2/");
    }

    #[test]
    fn test_base_url_missing_address() {
        let config = ServerConfig::default();
        assert!(matches!(
            config.base_url(),
            Err(AppError::MissingParameter(_))
        ));

        let blank = server("   ");
        assert!(matches!(blank.base_url(), Err(AppError::MissingParameter(_))));
    }

    #[test]
    fn test_base_url_invalid_address() {
        let result = server("https://bad host").base_url();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            user: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_poll_defaults() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_secs(2));
        assert_eq!(poll.max_attempts, 30);
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert!(!config.verify_tls);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.api_path, "web_api");
    }
}
