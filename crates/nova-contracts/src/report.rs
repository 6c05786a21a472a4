//! Run-level types: execution mode, run state machine, and the
//! `OrchestrationReport` produced by every run.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    agent::{AgentName, Phase},
    error::{NovaError, NovaResult},
    message::{AgentOutcome, Message},
    policy::PolicyRecord,
    task::{TaskRecord, TaskStatus},
};

/// Unique identifier for one orchestration run.
///
/// Commits every message hash to the run it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How agents within a phase are dispatched. Phases always run in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One agent at a time, in declared order.
    #[default]
    Sequential,
    /// All agents of a phase concurrently, joined at a barrier.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sequential => f.write_str("sequential"),
            ExecutionMode::Parallel => f.write_str("parallel"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = NovaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            other => Err(NovaError::ConfigError {
                reason: format!("unknown execution mode '{other}'"),
            }),
        }
    }
}

/// States of one orchestration run.
///
/// ```text
/// NotStarted → PhaseRunning(0) → PhaseDone(0) → PhaseRunning(1) → … → RunComplete
///                    └──────────────┴─────────────→ RunFailed | RunCancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "phase")]
pub enum RunState {
    NotStarted,
    PhaseRunning(usize),
    PhaseDone(usize),
    RunComplete,
    RunFailed,
    RunCancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::RunComplete | RunState::RunFailed | RunState::RunCancelled
        )
    }

    /// Validate a move to `next`, returning it on success.
    pub fn transition(self, next: RunState) -> NovaResult<RunState> {
        let legal = match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, RunState::RunFailed | RunState::RunCancelled) => true,
            (RunState::NotStarted, RunState::PhaseRunning(0) | RunState::RunComplete) => true,
            (RunState::PhaseRunning(i), RunState::PhaseDone(j)) => i == j,
            (RunState::PhaseDone(i), RunState::PhaseRunning(j)) => j == i + 1,
            (RunState::PhaseDone(_), RunState::RunComplete) => true,
            _ => false,
        };
        if legal {
            Ok(next)
        } else {
            Err(NovaError::InvalidRunTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => f.write_str("NOT_STARTED"),
            RunState::PhaseRunning(i) => write!(f, "PHASE_{i}_RUNNING"),
            RunState::PhaseDone(i) => write!(f, "PHASE_{i}_DONE"),
            RunState::RunComplete => f.write_str("RUN_COMPLETE"),
            RunState::RunFailed => f.write_str("RUN_FAILED"),
            RunState::RunCancelled => f.write_str("RUN_CANCELLED"),
        }
    }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Every task of every agent is `Done`.
    Success,
    /// At least one task is `Failed`; the run itself completed.
    PartialFailure,
    /// A fatal error ended the run early.
    Failed,
    /// The caller cancelled the run.
    Cancelled,
}

impl RunStatus {
    /// Derive the status of a completed run from its agent results.
    pub fn from_agents(agents: &[AgentRun]) -> Self {
        if agents.iter().all(|a| a.failed() == 0) {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure
        }
    }

    pub fn is_success(self) -> bool {
        self == RunStatus::Success
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::PartialFailure => "PARTIAL_FAILURE",
            RunStatus::Failed => "RUN_FAILED",
            RunStatus::Cancelled => "RUN_CANCELLED",
        };
        f.write_str(label)
    }
}

/// Everything one agent did during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRun {
    pub agent: AgentName,
    pub phase: String,
    /// One record per blueprint task, in blueprint order.
    pub tasks: Vec<TaskRecord>,
    /// Policy decisions taken for this agent's tasks.
    pub governance: Vec<PolicyRecord>,
    pub outcome: AgentOutcome,
}

impl AgentRun {
    pub fn done(&self) -> usize {
        self.count(TaskStatus::Done)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}

/// Completion figures for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    pub phase: String,
    pub done: usize,
    pub failed: usize,
    pub total: usize,
}

impl PhaseMetrics {
    /// Rounded percentage of tasks done; 0 for an empty phase.
    pub fn percent_done(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.done * 100 + self.total / 2) / self.total
        }
    }
}

/// The aggregate output of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub run_id: RunId,
    /// Wall-clock start of the run; the only non-deterministic field.
    pub started_at: DateTime<Utc>,
    pub mode: ExecutionMode,
    /// The phase plan this run executed.
    pub phases: Vec<Phase>,
    /// Agent results in plan order. Agents that never started are absent.
    pub agents: Vec<AgentRun>,
    /// The complete communication log in sequence order.
    pub messages: Vec<Message>,
    pub state: RunState,
    pub status: RunStatus,
    /// Why the run failed, when `status` is `Failed`.
    pub failure: Option<String>,
    /// `this_hash` of the last message; empty if none were published.
    pub terminal_hash: String,
}

impl OrchestrationReport {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn agent_run(&self, agent: &AgentName) -> Option<&AgentRun> {
        self.agents.iter().find(|run| &run.agent == agent)
    }

    /// Every `(agent, task)` pair whose task is `Failed`, in plan order.
    pub fn failed_tasks(&self) -> Vec<(AgentName, String)> {
        self.agents
            .iter()
            .flat_map(|run| {
                run.tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Failed)
                    .map(|t| (run.agent.clone(), t.name.clone()))
            })
            .collect()
    }

    /// Agents with at least one failed task, in plan order.
    pub fn failed_agents(&self) -> Vec<&AgentName> {
        self.agents
            .iter()
            .filter(|run| run.failed() > 0)
            .map(|run| &run.agent)
            .collect()
    }

    /// Number of tasks recorded per agent.
    pub fn task_counts(&self) -> Vec<(AgentName, usize)> {
        self.agents
            .iter()
            .map(|run| (run.agent.clone(), run.tasks.len()))
            .collect()
    }

    /// Per-phase completion figures in plan order.
    pub fn phase_metrics(&self) -> Vec<PhaseMetrics> {
        self.phases
            .iter()
            .map(|phase| {
                let runs = self.agents.iter().filter(|run| run.phase == phase.name);
                let mut metrics = PhaseMetrics {
                    phase: phase.name.clone(),
                    done: 0,
                    failed: 0,
                    total: 0,
                };
                for run in runs {
                    metrics.done += run.done();
                    metrics.failed += run.failed();
                    metrics.total += run.tasks.len();
                }
                metrics
            })
            .collect()
    }

    /// Every policy decision taken during the run, in plan order.
    pub fn governance(&self) -> impl Iterator<Item = &PolicyRecord> {
        self.agents.iter().flat_map(|run| run.governance.iter())
    }

    /// Messages concerning `agent`, in sequence order.
    pub fn messages_for_agent<'a>(
        &'a self,
        agent: &'a AgentName,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages
            .iter()
            .filter(move |m| m.payload.agent() == Some(agent))
    }
}
