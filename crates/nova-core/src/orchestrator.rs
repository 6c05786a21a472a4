//! The orchestration engine: phase-ordered, partial-failure tolerant runs.
//!
//! One call to [`Orchestrator::run`] drives the whole protocol:
//!
//!   PHASE_START → (AGENT_START → TASK_STATUS* → AGENT_DONE)* → barrier → PHASE_END
//!
//! for every phase in order. Agents of one phase run one at a time in declared
//! order (sequential) or concurrently on a worker pool (parallel); phases
//! never overlap. Task failures are recorded and the run carries on. A failed
//! publish is the only thing that ends a run early.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use nova_contracts::{
    agent::{AgentName, Phase, TaskSpec},
    error::{NovaError, NovaResult},
    message::{AgentOutcome, MessageDraft, MessagePayload, PriorOutcome, Recipient, Sender},
    policy::{PolicyDecision, PolicyRecord, PolicyRequest},
    report::{AgentRun, ExecutionMode, OrchestrationReport, RunId, RunState, RunStatus},
    task::{TaskFailure, TaskRecord, TaskStatus},
};
use nova_hub::{CommunicationHub, DEFAULT_CAPACITY};

use crate::{
    cancel::CancellationToken,
    executor::StepwiseExecutor,
    planner::PhasePlan,
    pool::WorkerPool,
    registry::BlueprintRegistry,
    traits::{PolicyEngine, TaskContext, TaskExecutor},
};

/// Policy action requested before every task.
pub const EXECUTE_TASK: &str = "execute-task";

// ── Run options ───────────────────────────────────────────────────────────────

/// Caller-owned settings for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: ExecutionMode,
    /// Restrict the run to these agents. `None` runs the whole plan.
    pub agents: Option<Vec<AgentName>>,
    /// Pool size in parallel mode; defaults to the widest phase.
    pub max_workers: Option<usize>,
    pub cancel: CancellationToken,
    /// Fixed start time, for reproducible reports. Defaults to now.
    pub started_at: Option<DateTime<Utc>>,
}

impl RunOptions {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode, ..Self::default() }
    }

    pub fn with_agents(mut self, agents: Vec<AgentName>) -> Self {
        self.agents = Some(agents);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }
}

/// A run that could not complete.
///
/// `report` holds every message published before the failure, or is `None`
/// when the run was rejected before it started (bad agent filter, bad pool
/// size).
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: NovaError,
    pub report: Option<Box<OrchestrationReport>>,
}

impl From<NovaError> for RunFailure {
    fn from(error: NovaError) -> Self {
        Self { error, report: None }
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// Drives orchestration runs over a shared registry and plan.
///
/// The registry and plan are read-only; each run gets its own hub and report,
/// so one orchestrator can serve several runs.
pub struct Orchestrator {
    registry: Arc<BlueprintRegistry>,
    plan: Arc<PhasePlan>,
    executor: Box<dyn TaskExecutor>,
    policy: Option<Box<dyn PolicyEngine>>,
    message_capacity: usize,
}

impl Orchestrator {
    /// An orchestrator using [`StepwiseExecutor`] and no policy gate.
    pub fn new(registry: Arc<BlueprintRegistry>, plan: Arc<PhasePlan>) -> Self {
        Self {
            registry,
            plan,
            executor: Box::new(StepwiseExecutor),
            policy: None,
            message_capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_executor(mut self, executor: Box<dyn TaskExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Authorize every task through `policy` before it runs.
    pub fn with_policy(mut self, policy: Box<dyn PolicyEngine>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }

    pub fn registry(&self) -> &BlueprintRegistry {
        &self.registry
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Execute one orchestration run.
    ///
    /// Returns the finished report for `Success`, `PartialFailure` and
    /// `Cancelled` runs. A publish failure ends the run `RUN_FAILED` and is
    /// returned as a `RunFailure` carrying the partial report.
    pub fn run(&self, options: &RunOptions) -> Result<OrchestrationReport, RunFailure> {
        let plan = match &options.agents {
            Some(agents) => {
                self.registry.subset(agents)?;
                self.plan.filtered(agents)?
            }
            None => self.plan.as_ref().clone(),
        };

        let pool = match options.mode {
            ExecutionMode::Parallel => {
                let workers = options
                    .max_workers
                    .unwrap_or_else(|| plan.widest_phase().max(1));
                Some(WorkerPool::new(workers)?)
            }
            ExecutionMode::Sequential => None,
        };

        let run_id = RunId::new();
        let mut run = ActiveRun {
            run_id,
            started_at: options.started_at.unwrap_or_else(Utc::now),
            mode: options.mode,
            hub: CommunicationHub::with_capacity(run_id, self.message_capacity),
            plan,
            state: RunState::NotStarted,
            agents: Vec::new(),
        };

        info!(
            run_id = %run_id,
            mode = %options.mode,
            phases = run.plan.phases().len(),
            workers = pool.as_ref().map(WorkerPool::workers).unwrap_or(1),
            "orchestration run starting"
        );

        match self.drive(&mut run, pool.as_ref(), &options.cancel) {
            Ok(()) => {
                let report = run.into_report(None);
                info!(
                    run_id = %report.run_id,
                    status = %report.status,
                    messages = report.messages.len(),
                    "orchestration run finished"
                );
                Ok(report)
            }
            Err(error) => {
                run.state = run
                    .state
                    .transition(RunState::RunFailed)
                    .unwrap_or(RunState::RunFailed);
                warn!(run_id = %run_id, error = %error, "orchestration run failed");
                let report = run.into_report(Some(error.to_string()));
                Err(RunFailure {
                    error,
                    report: Some(Box::new(report)),
                })
            }
        }
    }

    // ── Phase loop ────────────────────────────────────────────────────────────

    fn drive(
        &self,
        run: &mut ActiveRun,
        pool: Option<&WorkerPool>,
        cancel: &CancellationToken,
    ) -> NovaResult<()> {
        let phases = run.plan.phases().to_vec();

        for (index, phase) in phases.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(run_id = %run.run_id, phase = %phase.name, "run cancelled before phase start");
                return run.advance(RunState::RunCancelled);
            }

            run.advance(RunState::PhaseRunning(index))?;
            info!(
                run_id = %run.run_id,
                phase = %phase.name,
                agents = phase.agents.len(),
                "phase started"
            );
            run.hub.publish(MessageDraft {
                sender: Sender::Orchestrator,
                recipient: Recipient::Broadcast,
                payload: MessagePayload::PhaseStart {
                    phase: phase.name.clone(),
                    goal: phase.goal.clone(),
                    agents: phase.agents.clone(),
                },
            })?;

            let prior = run.prior_outcomes();
            let hub = &run.hub;
            let attempts: Vec<AgentAttempt> = match pool {
                // Barrier: returns only after every agent of the phase is done.
                Some(pool) => pool.barrier(&phase.agents, |agent| {
                    self.run_agent(hub, phase, agent, &prior, cancel)
                }),
                None => {
                    let mut attempts = Vec::with_capacity(phase.agents.len());
                    for agent in &phase.agents {
                        let attempt = self.run_agent(hub, phase, agent, &prior, cancel);
                        let fatal = attempt.error.is_some();
                        attempts.push(attempt);
                        if fatal {
                            break;
                        }
                    }
                    attempts
                }
            };

            // Keep every agent that ran, even when one of them hit a fatal error.
            let mut interrupted = false;
            let mut fatal = None;
            for attempt in attempts {
                match attempt.run {
                    Some(agent_run) => {
                        interrupted |= agent_run.outcome == AgentOutcome::Cancelled;
                        run.agents.push(agent_run);
                    }
                    None => interrupted = true,
                }
                if let Some(error) = attempt.error {
                    fatal.get_or_insert(error);
                }
            }
            if let Some(error) = fatal {
                return Err(error);
            }

            let (done, failed) = run
                .agents
                .iter()
                .filter(|a| a.phase == phase.name)
                .fold((0, 0), |(d, f), a| (d + a.done(), f + a.failed()));
            run.hub.publish(MessageDraft {
                sender: Sender::Orchestrator,
                recipient: Recipient::Phase(phase.name.clone()),
                payload: MessagePayload::PhaseEnd {
                    phase: phase.name.clone(),
                    done,
                    failed,
                },
            })?;
            run.advance(RunState::PhaseDone(index))?;
            info!(run_id = %run.run_id, phase = %phase.name, done, failed, "phase finished");

            if interrupted {
                info!(run_id = %run.run_id, phase = %phase.name, "run cancelled during phase");
                return run.advance(RunState::RunCancelled);
            }
        }

        run.advance(RunState::RunComplete)
    }

    // ── One agent ─────────────────────────────────────────────────────────────

    /// Run every task of `agent`. A run of `None` means the agent never
    /// started: cancellation skipped it or its AGENT_START was rejected.
    fn run_agent(
        &self,
        hub: &CommunicationHub,
        phase: &Phase,
        agent: &AgentName,
        prior: &[PriorOutcome],
        cancel: &CancellationToken,
    ) -> AgentAttempt {
        if cancel.is_cancelled() {
            debug!(agent = %agent, phase = %phase.name, "agent skipped after cancellation");
            return AgentAttempt::skipped();
        }

        let blueprint = match self.registry.get(agent) {
            Ok(blueprint) => blueprint,
            Err(error) => return AgentAttempt::unstarted(error),
        };
        let started = hub.publish(MessageDraft {
            sender: Sender::Orchestrator,
            recipient: Recipient::Agent(agent.clone()),
            payload: MessagePayload::AgentStart {
                agent: agent.clone(),
                phase: phase.name.clone(),
                task_count: blueprint.tasks().len(),
                depends_on: blueprint.depends_on().to_vec(),
                prior: prior.to_vec(),
            },
        });
        if let Err(error) = started {
            return AgentAttempt::unstarted(error);
        }
        debug!(agent = %agent, phase = %phase.name, tasks = blueprint.tasks().len(), "agent started");

        let mut agent_run = AgentRun {
            agent: agent.clone(),
            phase: phase.name.clone(),
            tasks: blueprint.tasks().iter().map(TaskRecord::pending).collect(),
            governance: Vec::new(),
            outcome: AgentOutcome::Aborted,
        };
        let error = self
            .run_tasks(hub, phase, blueprint.tasks(), &mut agent_run, prior, cancel)
            .err();
        if let Some(error) = &error {
            agent_run.outcome = AgentOutcome::Aborted;
            warn!(agent = %agent, error = %error, "agent aborted");
        }

        AgentAttempt {
            run: Some(agent_run),
            error,
        }
    }

    /// Task loop and AGENT_DONE for one started agent. Records in `agent_run`
    /// are updated in place, so whatever ran survives an error.
    fn run_tasks(
        &self,
        hub: &CommunicationHub,
        phase: &Phase,
        specs: &[TaskSpec],
        agent_run: &mut AgentRun,
        prior: &[PriorOutcome],
        cancel: &CancellationToken,
    ) -> NovaResult<()> {
        let agent = agent_run.agent.clone();
        let mut cancelled = false;

        for (position, (spec, record)) in specs.iter().zip(agent_run.tasks.iter_mut()).enumerate() {
            if cancel.is_cancelled() {
                debug!(agent = %agent, task = %spec.name, "stopping before task after cancellation");
                cancelled = true;
                break;
            }

            record.start()?;
            let outcome = match self.authorize(&agent, spec, &mut agent_run.governance) {
                Ok(()) => self.executor.execute(&TaskContext {
                    agent: &agent,
                    phase: &phase.name,
                    task: spec,
                    position,
                    prior,
                }),
                Err(denied) => Err(denied),
            };
            record.finish(outcome)?;

            let detail = if record.status == TaskStatus::Failed {
                warn!(
                    agent = %agent,
                    task = %record.name,
                    reason = record.failure.as_deref().unwrap_or(""),
                    "task failed"
                );
                record.failure.clone()
            } else {
                debug!(agent = %agent, task = %record.name, "task done");
                record.details.last().cloned()
            };

            hub.publish(MessageDraft {
                sender: Sender::Agent(agent.clone()),
                recipient: Recipient::Orchestrator,
                payload: MessagePayload::TaskStatus {
                    agent: agent.clone(),
                    phase: phase.name.clone(),
                    task: record.name.clone(),
                    status: record.status,
                    detail,
                },
            })?;
        }

        agent_run.outcome = if cancelled {
            AgentOutcome::Cancelled
        } else if agent_run.failed() > 0 {
            AgentOutcome::PartialFailure
        } else {
            AgentOutcome::Success
        };

        hub.publish(MessageDraft {
            sender: Sender::Agent(agent.clone()),
            recipient: Recipient::Orchestrator,
            payload: MessagePayload::AgentDone {
                agent: agent.clone(),
                phase: phase.name.clone(),
                outcome: agent_run.outcome,
                done: agent_run.done(),
                failed: agent_run.failed(),
            },
        })?;
        debug!(agent = %agent, outcome = %agent_run.outcome, "agent done");
        Ok(())
    }

    /// Consult the policy gate, if any. Fails closed on engine errors.
    fn authorize(
        &self,
        agent: &AgentName,
        task: &TaskSpec,
        governance: &mut Vec<PolicyRecord>,
    ) -> Result<(), TaskFailure> {
        let Some(policy) = &self.policy else {
            return Ok(());
        };

        let request = PolicyRequest::new(agent.as_str(), EXECUTE_TASK, task.name.as_str());
        let decision = match policy.authorize(&request) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(agent = %agent, task = %task.name, error = %e, "policy engine error; denying");
                PolicyDecision::deny(format!("policy engine error: {}", e))
            }
        };

        let allowed = decision.allow;
        let reason = decision.reason.clone();
        governance.push(PolicyRecord { request, decision });

        if allowed {
            Ok(())
        } else {
            warn!(agent = %agent, task = %task.name, reason = %reason, "policy denied task");
            Err(TaskFailure::new(format!("policy denied: {reason}")))
        }
    }
}

// ── Per-run state ─────────────────────────────────────────────────────────────

/// What one agent left behind in a phase.
struct AgentAttempt {
    run: Option<AgentRun>,
    error: Option<NovaError>,
}

impl AgentAttempt {
    fn skipped() -> Self {
        Self { run: None, error: None }
    }

    fn unstarted(error: NovaError) -> Self {
        Self {
            run: None,
            error: Some(error),
        }
    }
}

/// Hub, plan and results owned by exactly one run.
struct ActiveRun {
    run_id: RunId,
    started_at: DateTime<Utc>,
    mode: ExecutionMode,
    plan: PhasePlan,
    hub: CommunicationHub,
    state: RunState,
    agents: Vec<AgentRun>,
}

impl ActiveRun {
    fn advance(&mut self, next: RunState) -> NovaResult<()> {
        self.state = self.state.transition(next)?;
        debug!(run_id = %self.run_id, state = %self.state, "run state advanced");
        Ok(())
    }

    /// Outcomes of every agent that has finished so far.
    fn prior_outcomes(&self) -> Vec<PriorOutcome> {
        self.agents
            .iter()
            .map(|a| PriorOutcome {
                agent: a.agent.clone(),
                phase: a.phase.clone(),
                outcome: a.outcome,
            })
            .collect()
    }

    fn into_report(self, failure: Option<String>) -> OrchestrationReport {
        let status = match self.state {
            RunState::RunComplete => RunStatus::from_agents(&self.agents),
            RunState::RunCancelled => RunStatus::Cancelled,
            _ => RunStatus::Failed,
        };
        let phases = self.plan.phases().to_vec();
        let terminal_hash = self.hub.terminal_hash();

        OrchestrationReport {
            run_id: self.run_id,
            started_at: self.started_at,
            mode: self.mode,
            phases,
            agents: self.agents,
            messages: self.hub.into_messages(),
            state: self.state,
            status,
            failure,
            terminal_hash,
        }
    }
}
