//! Command-line surface
//!
//! Flags override the environment-derived [`Config`]. In interactive mode,
//! connection details still missing after that are asked for.

use crate::config::Config;
use crate::domain::RuleSelection;
use crate::error::Result;
use crate::prompt::Prompter;
use crate::service::{PublishPolicy, RunRequest, TrackRequest};
use clap::Parser;

/// Configure the Track setting of access rules and publish the result
#[derive(Parser, Debug)]
#[command(name = "rule-track")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Management server: host, host:port or https:// URL (also: MGMT_SERVER)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Management API port (also: MGMT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Administrator user (also: MGMT_USER)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Administrator password (also: MGMT_PASSWORD)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Policy package name
    #[arg(long)]
    pub package: Option<String>,

    /// Access layer name; optional when the package has a single layer
    #[arg(long)]
    pub layer: Option<String>,

    /// Select every rule of the layer
    #[arg(long)]
    pub all_rules: bool,

    /// Comma-separated 1-based rule numbers, or "all"
    #[arg(long, value_delimiter = ',', value_name = "N,..")]
    pub rules: Option<Vec<String>>,

    /// Comma-separated rule names
    #[arg(long, value_delimiter = ',', value_name = "NAME,..")]
    pub rule_names: Option<Vec<String>>,

    /// none, log, detailed-log or extended-log
    #[arg(short, long)]
    pub track_type: Option<String>,

    /// Enable accounting
    #[arg(long)]
    pub accounting: bool,

    /// Log per connection
    #[arg(long)]
    pub per_connection: bool,

    /// Log per session
    #[arg(long)]
    pub per_session: bool,

    /// Publish the changes once applied
    #[arg(long)]
    pub publish: bool,

    /// Publish without asking, even in interactive mode
    #[arg(long)]
    pub auto_publish: bool,

    /// Prompt for anything not given on the command line
    #[arg(short, long)]
    pub interactive: bool,

    /// Only print warnings, errors and the final summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output (also: NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// Validate the server's TLS certificate (also: MGMT_VERIFY_TLS)
    #[arg(long)]
    pub verify_tls: bool,

    /// Per-request timeout in seconds (also: MGMT_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Layer flags on top of `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.server.address = Some(server.clone());
        }
        if let Some(port) = self.port {
            config.server.port = Some(port);
        }
        if self.verify_tls {
            config.server.verify_tls = true;
        }
        if let Some(timeout) = self.timeout {
            config.server.timeout_secs = timeout;
        }
        if let Some(user) = &self.user {
            config.credentials.user = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.credentials.password = Some(password.clone());
        }
        if self.verbose {
            config.telemetry.verbose = true;
        }
        if self.quiet {
            config.output.quiet = true;
        }
        if self.no_color {
            config.output.color = false;
        }
    }

    pub fn selection(&self) -> Option<RuleSelection> {
        RuleSelection::from_specs(self.all_rules, self.rules.clone(), self.rule_names.clone())
    }

    pub fn track(&self) -> Option<TrackRequest> {
        self.track_type.as_ref().map(|track_type| TrackRequest {
            track_type: track_type.clone(),
            accounting: self.accounting,
            per_connection: self.per_connection,
            per_session: self.per_session,
        })
    }

    pub fn run_request(&self, config: &Config) -> RunRequest {
        RunRequest {
            credentials: config.credentials.clone(),
            package: self.package.clone(),
            layer: self.layer.clone(),
            selection: self.selection(),
            track: self.track(),
            publish: PublishPolicy::from_flags(self.publish, self.auto_publish, self.interactive),
            interactive: self.interactive,
        }
    }
}

/// Ask for the server address and credentials that are still missing.
pub fn prompt_missing<P: Prompter + ?Sized>(config: &mut Config, prompter: &mut P) -> Result<()> {
    if is_blank(&config.server.address) {
        config.server.address = Some(prompter.input("Management server")?);
    }
    if is_blank(&config.credentials.user) {
        config.credentials.user = Some(prompter.input("User")?);
    }
    if is_blank(&config.credentials.password) {
        config.credentials.password = Some(prompter.input("Password")?);
    }
    Ok(())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}
