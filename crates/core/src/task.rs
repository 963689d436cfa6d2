//! Mockup-generation task model.
//!
//! A mockup task is an asynchronous job on the backend keyed by an opaque
//! task key. [`TaskStatus`] is what one status check reports;
//! [`TaskState`] is the client-side lifecycle built from those reports.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Output image format of a generated mockup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockupFormat {
    #[default]
    Jpg,
    Png,
}

impl std::fmt::Display for MockupFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockupFormat::Jpg => f.write_str("jpg"),
            MockupFormat::Png => f.write_str("png"),
        }
    }
}

impl std::str::FromStr for MockupFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(MockupFormat::Jpg),
            "png" => Ok(MockupFormat::Png),
            other => Err(CoreError::Validation(format!(
                "Unknown mockup format '{other}'. Valid formats: jpg, png"
            ))),
        }
    }
}

/// Result of a single task status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Completed { mockup_url: String },
    Failed { error: String },
}

/// Client-side lifecycle of a mockup task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Submitted,
    Pending,
    Completed,
    Failed,
    /// The polling budget ran out while the task was still pending.
    TimedOut,
    /// Polling was cancelled by the caller.
    Cancelled,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Pending => "pending",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::TimedOut => "timed_out",
            TaskState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::TimedOut | TaskState::Cancelled
        )
    }

    /// Apply a status report.
    pub fn advance(self, status: &TaskStatus) -> Result<TaskState, CoreError> {
        let next = match status {
            TaskStatus::Pending => TaskState::Pending,
            TaskStatus::Completed { .. } => TaskState::Completed,
            TaskStatus::Failed { .. } => TaskState::Failed,
        };
        self.transition(next)
    }

    /// Attempt budget exhausted.
    pub fn time_out(self) -> Result<TaskState, CoreError> {
        self.transition(TaskState::TimedOut)
    }

    pub fn cancel(self) -> Result<TaskState, CoreError> {
        self.transition(TaskState::Cancelled)
    }

    fn transition(self, next: TaskState) -> Result<TaskState, CoreError> {
        let allowed = match self {
            TaskState::Submitted | TaskState::Pending => next != TaskState::Submitted,
            _ => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}
