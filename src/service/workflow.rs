//! Session-scoped change/publish workflow
//!
//! One run owns one editing session from login to logout. Stale pending
//! changes are discarded first; the desired track setting is tried on the
//! first selected rule before being applied to the rest; the pending change
//! set is then either published or discarded, and the session is always
//! logged out.

use super::poller::{TaskOutcome, TaskPoller, TaskReport};
use crate::config::{Credentials, PollConfig};
use crate::console::Console;
use crate::domain::{
    flatten_rulebase, select_rules, AccessRule, RuleSelection, TrackSpec, TrackType,
};
use crate::error::{AppError, Result};
use crate::mgmt::{ManagementApi, Session};
use crate::prompt::Prompter;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Track setting requested on the command line, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub track_type: String,
    pub accounting: bool,
    pub per_connection: bool,
    pub per_session: bool,
}

impl TrackRequest {
    pub fn resolve(&self) -> Result<TrackSpec> {
        Ok(TrackSpec::new(self.track_type.parse::<TrackType>()?).with_options(
            self.accounting,
            self.per_connection,
            self.per_session,
        ))
    }
}

/// What to do with the pending changes once they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPolicy {
    Always,
    /// Ask the operator
    Confirm,
    Never,
}

impl PublishPolicy {
    pub fn from_flags(publish: bool, auto_publish: bool, interactive: bool) -> Self {
        if publish || auto_publish {
            PublishPolicy::Always
        } else if interactive {
            PublishPolicy::Confirm
        } else {
            PublishPolicy::Never
        }
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub credentials: Credentials,
    pub package: Option<String>,
    pub layer: Option<String>,
    pub selection: Option<RuleSelection>,
    pub track: Option<TrackRequest>,
    pub publish: PublishPolicy,
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAs {
    Published,
    Discarded,
    /// Publish was submitted but did not complete; changes stay on the server.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Authenticating,
    PackageSelected,
    LayerSelected,
    RulesFetched,
    RulesSelected,
    ConfigGathering,
    ConfigValidating,
    ConfigApplied,
    Summarized,
    Resolved(ResolvedAs),
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeStatus {
    Applied,
    Failed(String),
}

/// Before/after record for one selected rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleChange {
    pub position: usize,
    pub uid: String,
    pub name: String,
    /// Track as fetched
    pub before: String,
    /// Track as requested; not re-read from the server
    pub after: String,
    pub status: ChangeStatus,
}

impl RuleChange {
    fn new(rule: &AccessRule, track: &TrackSpec, status: ChangeStatus) -> Self {
        Self {
            position: rule.position,
            uid: rule.uid.clone(),
            name: rule.display_name().to_string(),
            before: rule.track.to_string(),
            after: track.to_string(),
            status,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == ChangeStatus::Applied
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Task report is absent when the server returned no task id.
    Published(Option<TaskReport>),
    PublishFailed(String),
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub package: String,
    pub layer: String,
    pub track: TrackSpec,
    pub changes: Vec<RuleChange>,
    pub resolution: Resolution,
}

impl RunReport {
    pub fn success_count(&self) -> usize {
        self.changes.iter().filter(|c| c.is_applied()).count()
    }

    pub fn total(&self) -> usize {
        self.changes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The layer has no rules
    NoRules,
    /// The selection matched no rule
    NothingSelected,
    Completed(RunReport),
}

impl RunOutcome {
    pub fn exit_code(&self, interactive: bool) -> u8 {
        match self {
            RunOutcome::Completed(RunReport {
                resolution: Resolution::PublishFailed(_),
                ..
            }) if !interactive => 1,
            _ => 0,
        }
    }
}

enum ConfigPhase {
    Gather,
    Validate(TrackSpec),
    Apply(TrackSpec),
}

pub struct PublishWorkflow<A: ManagementApi, P: Prompter> {
    api: Arc<A>,
    prompter: P,
    console: Console,
    poll: PollConfig,
    history: Vec<WorkflowState>,
    /// Pending changes were published or discarded in this session
    changes_resolved: bool,
}

impl<A: ManagementApi, P: Prompter> PublishWorkflow<A, P> {
    pub fn new(api: Arc<A>, prompter: P, console: Console, poll: PollConfig) -> Self {
        Self {
            api,
            prompter,
            console,
            poll,
            history: Vec::new(),
            changes_resolved: false,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.history.last().copied().unwrap_or(WorkflowState::Idle)
    }

    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    fn transition(&mut self, state: WorkflowState) {
        debug!(?state, "workflow transition");
        self.history.push(state);
    }

    /// Execute one full run.
    ///
    /// Once a session exists it is always logged out, and any pending
    /// changes that were not submitted for publish are discarded first.
    pub async fn run(&mut self, request: RunRequest) -> Result<RunOutcome> {
        let explicit_track = request
            .track
            .as_ref()
            .map(TrackRequest::resolve)
            .transpose()?;
        if !request.interactive {
            if request.package.is_none() {
                return Err(AppError::MissingParameter(
                    "policy package (--package)".to_string(),
                ));
            }
            if request.selection.is_none() {
                return Err(AppError::MissingParameter(
                    "rule selection (--all-rules, --rules or --rule-names)".to_string(),
                ));
            }
            if explicit_track.is_none() {
                return Err(AppError::MissingParameter(
                    "track type (--track-type)".to_string(),
                ));
            }
        }
        let (user, password) = match (&request.credentials.user, &request.credentials.password) {
            (Some(user), Some(password)) => (user.clone(), password.clone()),
            (None, _) => return Err(AppError::MissingParameter("user".to_string())),
            (_, None) => return Err(AppError::MissingParameter("password".to_string())),
        };

        self.transition(WorkflowState::Authenticating);
        self.changes_resolved = false;
        let session = self.api.login(&user, &password).await?;
        info!(user = %user, "logged in");

        if let Err(e) = self.api.discard(&session).await {
            warn!(error = %e, "could not discard stale changes");
        }

        let result = self
            .run_in_session(&session, &request, explicit_track)
            .await;

        if !self.changes_resolved {
            self.discard_pending(&session).await;
        }
        if let Err(e) = self.api.logout(&session).await {
            warn!(error = %e, "logout failed");
            self.console.warn(&format!("Logout failed: {}", e));
        }
        self.transition(WorkflowState::LoggedOut);

        result
    }

    async fn run_in_session(
        &mut self,
        session: &Session,
        request: &RunRequest,
        explicit_track: Option<TrackSpec>,
    ) -> Result<RunOutcome> {
        let package = self.resolve_package(session, request).await?;
        self.transition(WorkflowState::PackageSelected);

        let layer = self.resolve_layer(session, &package, request).await?;
        self.transition(WorkflowState::LayerSelected);

        let page = self.api.show_access_rulebase(session, &layer).await?;
        let rules = flatten_rulebase(&page);
        self.transition(WorkflowState::RulesFetched);
        if rules.is_empty() {
            self.console
                .warn(&format!("Layer '{}' has no access rules", layer));
            return Ok(RunOutcome::NoRules);
        }
        self.console.rules(&rules);

        let selection = match &request.selection {
            Some(selection) => selection.clone(),
            None => self.prompt_selection()?,
        };
        let selected = select_rules(&rules, &selection);
        for skipped in &selected.skipped {
            self.console.warn(&format!("Skipped: {}", skipped));
        }
        self.transition(WorkflowState::RulesSelected);

        let Some((first, rest)) = selected.rules.split_first() else {
            self.console.warn("No rules selected, nothing to do");
            return Ok(RunOutcome::NothingSelected);
        };

        let track = self
            .validate_track(session, &layer, first, explicit_track, request.interactive)
            .await?;
        let changes = self.apply_track(session, &layer, first, rest, &track).await;
        self.transition(WorkflowState::ConfigApplied);

        let mut report = RunReport {
            package,
            layer,
            track,
            changes,
            resolution: Resolution::Discarded,
        };
        self.console.summary(&report);
        self.transition(WorkflowState::Summarized);

        report.resolution = self.resolve_changes(session, request.publish).await?;
        Ok(RunOutcome::Completed(report))
    }

    async fn resolve_package(
        &mut self,
        session: &Session,
        request: &RunRequest,
    ) -> Result<String> {
        let names: Vec<String> = self
            .api
            .show_packages(session)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        if names.is_empty() {
            return Err(AppError::NotFound(
                "No policy packages found on the server".to_string(),
            ));
        }

        self.choose(
            "policy package",
            "--package",
            names,
            request.package.as_deref(),
            request.interactive,
            false,
        )
    }

    async fn resolve_layer(
        &mut self,
        session: &Session,
        package: &str,
        request: &RunRequest,
    ) -> Result<String> {
        let names: Vec<String> = self
            .api
            .show_package(session, package)
            .await?
            .into_iter()
            .map(|l| l.name)
            .collect();
        if names.is_empty() {
            return Err(AppError::NotFound(format!(
                "Package '{}' has no access layers",
                package
            )));
        }

        self.choose(
            "access layer",
            "--layer",
            names,
            request.layer.as_deref(),
            request.interactive,
            true,
        )
    }

    /// Pick one name: the explicit one if it exists, the only one when
    /// `auto_single` applies, or the operator's choice.
    fn choose(
        &mut self,
        kind: &str,
        flag: &str,
        names: Vec<String>,
        explicit: Option<&str>,
        interactive: bool,
        auto_single: bool,
    ) -> Result<String> {
        if let Some(wanted) = explicit {
            return names
                .iter()
                .find(|n| n.as_str() == wanted)
                .cloned()
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "{} '{}' not found (available: {})",
                        kind,
                        wanted,
                        names.join(", ")
                    ))
                });
        }

        if auto_single && names.len() == 1 {
            self.console
                .info(&format!("Using {} '{}'", kind, names[0]));
            return Ok(names[0].clone());
        }

        if !interactive {
            return Err(AppError::MissingParameter(format!("{} ({})", kind, flag)));
        }

        let index = self
            .prompter
            .select(&format!("Select a {}", kind), &names)?;
        names.get(index).cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("selection {} out of range", index))
        })
    }

    fn prompt_selection(&mut self) -> Result<RuleSelection> {
        loop {
            let input = self
                .prompter
                .input("Rules to update ('all' or comma-separated numbers)")?;
            if let Some(selection) = RuleSelection::parse_input(&input) {
                return Ok(selection);
            }
            self.console
                .warn("Enter 'all' or at least one rule number");
        }
    }

    fn prompt_track(&mut self) -> Result<TrackSpec> {
        let track_type = loop {
            let input = self
                .prompter
                .input("Track type (none, log, detailed-log, extended-log)")?;
            match input.parse::<TrackType>() {
                Ok(track_type) => break track_type,
                Err(e) => self.console.error(&e.to_string()),
            }
        };

        if !track_type.takes_options() {
            return Ok(TrackSpec::new(track_type));
        }

        let accounting = self.prompter.confirm("Enable accounting?", false)?;
        let per_connection = self.prompter.confirm("Log per connection?", false)?;
        let per_session = self.prompter.confirm("Log per session?", false)?;
        Ok(TrackSpec::new(track_type).with_options(accounting, per_connection, per_session))
    }

    /// Settle on a track setting the server accepts, using `first` as the
    /// live test. A rejection sends interactive runs back to gathering a
    /// new setting and aborts unattended ones.
    async fn validate_track(
        &mut self,
        session: &Session,
        layer: &str,
        first: &AccessRule,
        explicit: Option<TrackSpec>,
        interactive: bool,
    ) -> Result<TrackSpec> {
        let mut explicit = explicit;
        let mut phase = ConfigPhase::Gather;

        loop {
            phase = match phase {
                ConfigPhase::Gather => {
                    self.transition(WorkflowState::ConfigGathering);
                    let track = match explicit.take() {
                        Some(track) => track,
                        None => self.prompt_track()?,
                    };
                    ConfigPhase::Validate(track)
                }
                ConfigPhase::Validate(track) => {
                    self.transition(WorkflowState::ConfigValidating);
                    self.console.info(&format!(
                        "Testing '{}' on rule {} ({})",
                        track,
                        first.position,
                        first.display_name()
                    ));

                    match self
                        .api
                        .set_access_rule(session, layer, &first.uid, &track)
                        .await
                    {
                        Ok(()) => ConfigPhase::Apply(track),
                        Err(e) => {
                            let rejection = AppError::Validation(format!(
                                "rule {} rejected track '{}': {}",
                                first.position,
                                track,
                                e.server_message()
                            ));
                            if !interactive {
                                return Err(rejection);
                            }

                            // Shown here once; a declined retry returns a short error.
                            self.console.error(&rejection.to_string());
                            if !self
                                .prompter
                                .confirm("Try a different track configuration?", true)?
                            {
                                return Err(AppError::Validation(format!(
                                    "track '{}' was not accepted, no rule was changed",
                                    track
                                )));
                            }
                            ConfigPhase::Gather
                        }
                    }
                }
                ConfigPhase::Apply(track) => return Ok(track),
            };
        }
    }

    /// Apply `track` to the remaining rules. Failures are recorded and the
    /// loop carries on.
    async fn apply_track(
        &mut self,
        session: &Session,
        layer: &str,
        first: &AccessRule,
        rest: &[AccessRule],
        track: &TrackSpec,
    ) -> Vec<RuleChange> {
        let mut changes = vec![RuleChange::new(first, track, ChangeStatus::Applied)];

        for rule in rest {
            let status = match self
                .api
                .set_access_rule(session, layer, &rule.uid, track)
                .await
            {
                Ok(()) => ChangeStatus::Applied,
                Err(e) => {
                    warn!(rule = %rule.uid, error = %e, "set-access-rule failed");
                    self.console.warn(&format!(
                        "Rule {} ({}) not updated: {}",
                        rule.position,
                        rule.display_name(),
                        e.server_message()
                    ));
                    ChangeStatus::Failed(e.server_message())
                }
            };
            changes.push(RuleChange::new(rule, track, status));
        }

        changes
    }

    async fn resolve_changes(
        &mut self,
        session: &Session,
        policy: PublishPolicy,
    ) -> Result<Resolution> {
        let publish = match policy {
            PublishPolicy::Always => true,
            PublishPolicy::Confirm => {
                self.prompter.confirm("Publish these changes?", false)?
            }
            PublishPolicy::Never => false,
        };

        if !publish {
            self.discard_pending(session).await;
            self.console.info("Changes discarded, nothing was published");
            self.transition(WorkflowState::Resolved(ResolvedAs::Discarded));
            return Ok(Resolution::Discarded);
        }

        // From here on the changes belong to the publish; never discard them.
        self.changes_resolved = true;
        self.console.info("Publishing changes...");

        let resolution = match self.api.publish(session).await {
            Err(e) => Resolution::PublishFailed(e.to_string()),
            Ok(None) => Resolution::Published(None),
            Ok(Some(task_id)) => {
                let report = TaskPoller::new(self.api.as_ref(), &self.poll, &self.console)
                    .wait(session, &task_id)
                    .await;
                if let TaskOutcome::PartiallySucceeded { details } = &report.outcome {
                    for detail in details {
                        self.console.warn(detail);
                    }
                }
                if report.outcome.is_success() {
                    Resolution::Published(Some(report))
                } else {
                    Resolution::PublishFailed(
                        report
                            .outcome
                            .failure_reason()
                            .unwrap_or_else(|| "publish task failed".to_string()),
                    )
                }
            }
        };

        match &resolution {
            Resolution::PublishFailed(reason) => {
                self.console.error(&format!("Publish failed: {}", reason));
                self.console.warn(
                    "Changes were not published and remain pending on the server; \
                     resolve them from the management console",
                );
                self.transition(WorkflowState::Resolved(ResolvedAs::Pending));
            }
            _ => {
                self.console.success(
                    "Changes published. The policy was not installed; \
                     install it on the gateways manually",
                );
                self.transition(WorkflowState::Resolved(ResolvedAs::Published));
            }
        }

        Ok(resolution)
    }

    async fn discard_pending(&mut self, session: &Session) {
        self.changes_resolved = true;
        if let Err(e) = self.api.discard(session).await {
            warn!(error = %e, "discard failed");
            self.console
                .warn(&format!("Discarding pending changes failed: {}", e));
        }
    }
}
