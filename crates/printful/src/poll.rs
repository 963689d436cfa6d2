//! Fixed-interval polling of mockup-generation tasks.
//!
//! [`poll_mockup_status`] checks a task immediately and then every
//! [`PollConfig::interval`] until it completes, fails, the attempt budget
//! runs out, or the [`CancellationToken`] is triggered. The delay does not
//! grow between attempts.
//!
//! [`spawn_poll`] runs the same loop as a detached task whose
//! [`PollHandle`] cancels it when dropped.

use std::sync::Arc;
use std::time::Duration;

use printlab_core::{TaskState, TaskStatus};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::api::ApiError;
use crate::backend::TaskStatusSource;

/// Polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status checks.
    pub max_attempts: u32,
    /// Delay between two consecutive checks.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(2000),
        }
    }
}

/// Why polling did not yield a mockup URL.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The backend reported the task as failed.
    #[error("Mockup task {task_key} failed: {message}")]
    TaskFailed { task_key: String, message: String },

    /// The task was still pending after every allowed attempt.
    #[error("Mockup task {task_key} still pending after {attempts} status checks")]
    TimedOut { task_key: String, attempts: u32 },

    /// A status check could not be completed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller cancelled polling.
    #[error("Polling of mockup task {task_key} was cancelled")]
    Cancelled { task_key: String },

    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(String),

    /// The spawned polling task panicked or was aborted.
    #[error("Polling task terminated abnormally: {0}")]
    Aborted(String),
}

/// Poll `task_key` until it reaches a terminal state.
///
/// Returns the mockup URL of the first `completed` report; no status check
/// is made after a terminal report.
pub async fn poll_mockup_status(
    source: &dyn TaskStatusSource,
    task_key: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<String, PollError> {
    if config.max_attempts == 0 {
        return Err(PollError::InvalidConfig(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    let cancelled = || PollError::Cancelled {
        task_key: task_key.to_string(),
    };
    let mut state = TaskState::Submitted;

    for attempt in 1..=config.max_attempts {
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log_transition(task_key, state, &state.cancel());
                return Err(cancelled());
            }
            status = source.task_status(task_key) => status?,
        };

        let next = state.advance(&status);
        log_transition(task_key, state, &next);
        if let Ok(next) = next {
            state = next;
        }

        match status {
            TaskStatus::Completed { mockup_url } => {
                tracing::info!(task_key, attempt, mockup_url = %mockup_url, "Mockup task completed");
                return Ok(mockup_url);
            }
            TaskStatus::Failed { error } => {
                tracing::warn!(task_key, attempt, error = %error, "Mockup task failed");
                return Err(PollError::TaskFailed {
                    task_key: task_key.to_string(),
                    message: error,
                });
            }
            TaskStatus::Pending => {
                tracing::debug!(
                    task_key,
                    attempt,
                    max_attempts = config.max_attempts,
                    "Mockup task pending",
                );
            }
        }

        if attempt < config.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log_transition(task_key, state, &state.cancel());
                    return Err(cancelled());
                }
                _ = tokio::time::sleep(config.interval) => {}
            }
        }
    }

    log_transition(task_key, state, &state.time_out());
    tracing::warn!(
        task_key,
        attempts = config.max_attempts,
        "Mockup task polling exhausted its attempt budget",
    );
    Err(PollError::TimedOut {
        task_key: task_key.to_string(),
        attempts: config.max_attempts,
    })
}

fn log_transition(
    task_key: &str,
    from: TaskState,
    to: &Result<TaskState, printlab_core::CoreError>,
) {
    match to {
        Ok(to) if *to != from => {
            tracing::debug!(task_key, from = from.as_str(), to = to.as_str(), "Mockup task state");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(task_key, error = %e, "Unexpected mockup task transition"),
    }
}

/// A polling loop running on its own task.
///
/// Dropping the handle cancels the loop.
pub struct PollHandle {
    task_key: String,
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<Result<String, PollError>>,
    guard: DropGuard,
}

impl PollHandle {
    pub fn task_key(&self) -> &str {
        &self.task_key
    }

    /// Request cancellation without waiting for the loop to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the polling result.
    pub async fn wait(self) -> Result<String, PollError> {
        let PollHandle { join, guard, .. } = self;
        let result = join.await;
        drop(guard);
        result.map_err(|e| PollError::Aborted(e.to_string()))?
    }
}

/// Spawn [`poll_mockup_status`] on the runtime.
///
/// The loop stops when `parent` is cancelled, when [`PollHandle::cancel`]
/// is called, or when the handle is dropped.
pub fn spawn_poll(
    source: Arc<dyn TaskStatusSource>,
    task_key: String,
    config: PollConfig,
    parent: &CancellationToken,
) -> PollHandle {
    let cancel = parent.child_token();
    let loop_cancel = cancel.clone();
    let key = task_key.clone();

    let join = tokio::spawn(async move {
        poll_mockup_status(source.as_ref(), &key, &config, &loop_cancel).await
    });

    PollHandle {
        task_key,
        guard: cancel.clone().drop_guard(),
        cancel,
        join,
    }
}
