//! Policy request and decision types.
//!
//! The policy collaborator answers `{subject, action, resource}` with
//! `{allow, reason}`. Anything other than an explicit allow is a denial.

use serde::{Deserialize, Serialize};

/// Everything a policy engine needs to make a decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRequest {
    /// Who wants to act, normally an agent name.
    pub subject: String,
    /// What they want to do (e.g. "execute-task").
    pub action: String,
    /// What the action targets (e.g. a task name).
    pub resource: String,
}

impl PolicyRequest {
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
        }
    }
}

/// The decision a policy engine returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow: bool,
    /// Human-readable explanation, recorded in the report.
    pub reason: String,
}

impl PolicyDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self { allow: true, reason: reason.into() }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self { allow: false, reason: reason.into() }
    }
}

impl Default for PolicyDecision {
    /// Fail closed.
    fn default() -> Self {
        Self::deny("denied by default")
    }
}

/// A policy decision as recorded in the orchestration report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub request: PolicyRequest,
    pub decision: PolicyDecision,
}
