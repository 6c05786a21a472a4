//! Per-run task state and executor results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    agent::TaskSpec,
    error::{NovaError, NovaResult},
};

/// Lifecycle of a task within one run.
///
/// Legal transitions: `Pending → Running → {Done, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    /// Validate a move to `next`, returning it on success.
    pub fn transition(self, next: TaskStatus) -> NovaResult<TaskStatus> {
        match (self, next) {
            (TaskStatus::Pending, TaskStatus::Running)
            | (TaskStatus::Running, TaskStatus::Done)
            | (TaskStatus::Running, TaskStatus::Failed) => Ok(next),
            (from, to) => Err(NovaError::InvalidTransition { from, to }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Done => "DONE",
            TaskStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// What a `TaskExecutor` returns for a task that succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Progress lines, e.g. "step-completed: install docker".
    pub details: Vec<String>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
    /// Free-form result payload.
    pub result: Option<serde_json::Value>,
}

/// A task's logical failure.
///
/// Executors return this instead of an error; the engine records it as a
/// `FAILED` status and moves on to the next task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub reason: String,
}

impl TaskFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Mutable state of one task during one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub status: TaskStatus,
    pub details: Vec<String>,
    pub warnings: Vec<String>,
    pub result: Option<serde_json::Value>,
    /// Set only when `status` is `Failed`.
    pub failure: Option<String>,
}

impl TaskRecord {
    /// A fresh `Pending` record for `spec`.
    pub fn pending(spec: &TaskSpec) -> Self {
        Self {
            name: spec.name.clone(),
            status: TaskStatus::Pending,
            details: Vec::new(),
            warnings: Vec::new(),
            result: None,
            failure: None,
        }
    }

    /// Move to `Running`.
    pub fn start(&mut self) -> NovaResult<()> {
        self.status = self.status.transition(TaskStatus::Running)?;
        Ok(())
    }

    /// Move to `Done` or `Failed` depending on the executor's outcome.
    pub fn finish(&mut self, outcome: Result<TaskOutput, TaskFailure>) -> NovaResult<()> {
        match outcome {
            Ok(output) => {
                self.status = self.status.transition(TaskStatus::Done)?;
                self.details = output.details;
                self.warnings = output.warnings;
                self.result = output.result;
            }
            Err(failure) => {
                self.status = self.status.transition(TaskStatus::Failed)?;
                self.failure = Some(failure.reason);
            }
        }
        Ok(())
    }
}
