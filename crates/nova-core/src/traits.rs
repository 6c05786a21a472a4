//! Trait seams of the orchestration engine.
//!
//! - `TaskExecutor` — runs one blueprint task; may be backed by real tooling
//! - `PolicyEngine` — allow/deny gate consulted before each task
//!
//! The engine owns sequencing, messaging, and state transitions. Executors
//! only turn a task into a result.

use nova_contracts::{
    agent::{AgentName, TaskSpec},
    error::NovaResult,
    message::PriorOutcome,
    policy::{PolicyDecision, PolicyRequest},
    task::{TaskFailure, TaskOutput},
};

/// Everything an executor may read while running one task.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub agent: &'a AgentName,
    pub phase: &'a str,
    pub task: &'a TaskSpec,
    /// Zero-based position of the task in its blueprint.
    pub position: usize,
    /// Outcomes of every agent that finished in an earlier phase.
    pub prior: &'a [PriorOutcome],
}

/// Runs a single task on behalf of an agent.
///
/// Called from worker threads in parallel mode, hence `Send + Sync`. A
/// task's logical failure is returned as `TaskFailure`; the engine records it
/// and carries on with the next task.
pub trait TaskExecutor: Send + Sync {
    /// Execute `ctx.task` synchronously.
    fn execute(&self, ctx: &TaskContext<'_>) -> Result<TaskOutput, TaskFailure>;
}

/// External allow/deny decision point.
///
/// Implementations must be deterministic and fail closed: when in doubt,
/// return a decision with `allow = false`. An `Err` is treated by the engine
/// as a denial.
pub trait PolicyEngine: Send + Sync {
    fn authorize(&self, request: &PolicyRequest) -> NovaResult<PolicyDecision>;
}
