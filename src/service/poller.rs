//! Polling of asynchronous server tasks (publish)

use crate::config::PollConfig;
use crate::console::Console;
use crate::mgmt::{ManagementApi, Session};
use tracing::{debug, warn};

/// Terminal state of a polled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// Counts as success; details are surfaced as warnings.
    PartiallySucceeded { details: Vec<String> },
    Failed { details: Vec<String> },
    TimedOut,
    /// A status request failed; polling stopped at once.
    PollError(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskOutcome::Succeeded | TaskOutcome::PartiallySucceeded { .. }
        )
    }

    /// Human-readable reason for a failed outcome.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            TaskOutcome::Succeeded | TaskOutcome::PartiallySucceeded { .. } => None,
            TaskOutcome::Failed { details } if details.is_empty() => {
                Some("publish task failed".to_string())
            }
            TaskOutcome::Failed { details } => {
                Some(format!("publish task failed: {}", details.join("; ")))
            }
            TaskOutcome::TimedOut => Some("timed out waiting for the publish task".to_string()),
            TaskOutcome::PollError(message) => {
                Some(format!("could not read publish task status: {}", message))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task_id: String,
    pub outcome: TaskOutcome,
    /// Number of status requests issued
    pub polls: u32,
}

pub struct TaskPoller<'a, A: ManagementApi + ?Sized> {
    api: &'a A,
    policy: &'a PollConfig,
    console: &'a Console,
}

impl<'a, A: ManagementApi + ?Sized> TaskPoller<'a, A> {
    pub fn new(api: &'a A, policy: &'a PollConfig, console: &'a Console) -> Self {
        Self {
            api,
            policy,
            console,
        }
    }

    /// Poll `task_id` until it reaches a terminal status or the attempt
    /// budget runs out. Transport errors are not retried.
    pub async fn wait(&self, session: &Session, task_id: &str) -> TaskReport {
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            if attempt > 1 {
                tokio::time::sleep(self.policy.interval).await;
            }

            let status = match self.api.show_task(session, task_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(task_id, attempt, error = %e, "task status request failed");
                    return self.report(task_id, TaskOutcome::PollError(e.to_string()), attempt);
                }
            };

            debug!(
                task_id,
                attempt,
                status = %status.status,
                progress = status.progress,
                "task status"
            );
            self.console
                .progress(attempt, max, &status.status, status.progress);

            let outcome = match status.status.trim().to_lowercase().as_str() {
                "succeeded" => TaskOutcome::Succeeded,
                "failed" => TaskOutcome::Failed {
                    details: status.details,
                },
                "partially succeeded" => TaskOutcome::PartiallySucceeded {
                    details: status.details,
                },
                _ => continue,
            };
            return self.report(task_id, outcome, attempt);
        }

        warn!(task_id, attempts = max, "task did not finish in time");
        self.report(task_id, TaskOutcome::TimedOut, max)
    }

    fn report(&self, task_id: &str, outcome: TaskOutcome, polls: u32) -> TaskReport {
        TaskReport {
            task_id: task_id.to_string(),
            outcome,
            polls,
        }
    }
}
