//! Agent identity, blueprint, and phase types.
//!
//! Blueprints are built once from static configuration and never mutated.
//! Per-run task state lives in [`crate::task::TaskRecord`], not here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NovaError, NovaResult};

/// Stable, human-readable name of a specialist agent.
///
/// Names are case-sensitive. Example: AgentName("Orion")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(pub String);

impl AgentName {
    /// Construct a name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single unit of work in an agent blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Short identifier, unique within its blueprint (e.g. "install-grafana").
    pub name: String,
    /// What the task is meant to achieve.
    #[serde(default)]
    pub goal: String,
    /// Ordered, actionable steps.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Expected artefacts or side effects.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            goal: goal.into(),
            steps: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append a step, builder style.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }
}

/// The static definition of one specialist role.
///
/// Only constructible through [`AgentBlueprint::new`], so the task list is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentBlueprint {
    name: AgentName,
    description: String,
    tasks: Vec<TaskSpec>,
    depends_on: Vec<AgentName>,
}

impl AgentBlueprint {
    /// Build a blueprint. Fails with `EmptyBlueprint` if `tasks` is empty.
    pub fn new(
        name: impl Into<AgentName>,
        description: impl Into<String>,
        tasks: Vec<TaskSpec>,
    ) -> NovaResult<Self> {
        let name = name.into();
        if tasks.is_empty() {
            return Err(NovaError::EmptyBlueprint { agent: name.0 });
        }
        Ok(Self {
            name,
            description: description.into(),
            tasks,
            depends_on: Vec::new(),
        })
    }

    /// Declare agents whose results this agent reviews before starting.
    pub fn with_dependencies(mut self, depends_on: Vec<AgentName>) -> Self {
        self.depends_on = depends_on;
        self
    }

    pub fn name(&self) -> &AgentName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn depends_on(&self) -> &[AgentName] {
        &self.depends_on
    }
}

/// A named stage grouping agents that are activated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    /// Human-readable goal, broadcast when the phase starts.
    pub goal: String,
    /// Member agents in declared order.
    pub agents: Vec<AgentName>,
}

impl Phase {
    pub fn contains(&self, agent: &AgentName) -> bool {
        self.agents.contains(agent)
    }
}
