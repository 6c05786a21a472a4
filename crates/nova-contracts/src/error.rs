//! Error types for the Nova orchestrator.
//!
//! Configuration errors (`DuplicateAgent`, `UnknownAgent`, `UnassignedAgent`,
//! `Planning`, `EmptyBlueprint`) are raised eagerly before any run starts.
//! `PublishFailed` is the only error that ends a run early. Task failures are
//! not errors at all; see [`crate::task::TaskFailure`].

use std::fmt;

use thiserror::Error;

use crate::{report::RunState, task::TaskStatus};

/// The unified error type for the Nova crates.
#[derive(Debug, Error)]
pub enum NovaError {
    /// A blueprint with this name is already registered.
    #[error("agent '{agent}' is already registered")]
    DuplicateAgent { agent: String },

    /// One or more agent names are not present in the registry.
    #[error("unknown agent(s): {}", .agents.join(", "))]
    UnknownAgent { agents: Vec<String> },

    /// The agent is registered but the plan places it in no phase.
    #[error("agent '{agent}' is not assigned to any phase")]
    UnassignedAgent { agent: String },

    /// The phase configuration does not match the registry.
    #[error("planning error: {}", join_issues(.issues))]
    Planning { issues: Vec<PlanningIssue> },

    /// A blueprint was declared without any tasks.
    #[error("blueprint for agent '{agent}' defines no tasks")]
    EmptyBlueprint { agent: String },

    /// A task status moved backwards or skipped a state.
    #[error("illegal task transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// The orchestration run state machine was driven out of order.
    #[error("illegal run transition from {from} to {to}")]
    InvalidRunTransition { from: RunState, to: RunState },

    /// The communication hub rejected a message.
    ///
    /// Fatal to the run: the engine stops and returns the partial report.
    #[error("message publish failed: {reason}")]
    PublishFailed { reason: String },

    /// The policy engine could not produce a decision.
    #[error("policy engine unavailable: {reason}")]
    PolicyUnavailable { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The rendered report could not be written.
    #[error("failed to write report to '{path}': {reason}")]
    ReportWrite { path: String, reason: String },
}

/// Convenience alias used throughout the Nova crates.
pub type NovaResult<T> = Result<T, NovaError>;

/// One mismatch found while validating phases against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningIssue {
    /// A phase lists an agent the registry does not know.
    UnknownAgent { phase: String, agent: String },
    /// A registered agent appears in no phase.
    Unassigned { agent: String },
    /// An agent appears in more than one phase (or twice in one).
    MultiplyAssigned { agent: String, phases: Vec<String> },
    /// A phase has no member agents.
    EmptyPhase { phase: String },
    /// Two phases share a name.
    DuplicatePhase { phase: String },
    /// A declared dependency is unknown or does not run in an earlier phase.
    DependencyNotEarlier { agent: String, dependency: String },
}

impl fmt::Display for PlanningIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAgent { phase, agent } => {
                write!(f, "phase '{phase}' references unknown agent '{agent}'")
            }
            Self::Unassigned { agent } => write!(f, "agent '{agent}' is unassigned"),
            Self::MultiplyAssigned { agent, phases } => write!(
                f,
                "agent '{agent}' is assigned more than once ({})",
                phases.join(", ")
            ),
            Self::EmptyPhase { phase } => write!(f, "phase '{phase}' has no agents"),
            Self::DuplicatePhase { phase } => write!(f, "phase '{phase}' is declared twice"),
            Self::DependencyNotEarlier { agent, dependency } => write!(
                f,
                "agent '{agent}' depends on '{dependency}', which does not run in an earlier phase"
            ),
        }
    }
}

fn join_issues(issues: &[PlanningIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
