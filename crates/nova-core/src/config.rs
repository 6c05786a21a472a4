//! Mission configuration: blueprints, phases, and run settings from TOML.
//!
//! ```toml
//! [orchestration]
//! mode = "parallel"
//! max_workers = 4
//!
//! [[agents]]
//! name = "Nova"
//! description = "Infrastructure lead"
//!
//! [[agents.tasks]]
//! name = "infrastructure-audit"
//! goal = "Inventory the hardware baseline"
//! steps = ["collect inventory", "record findings"]
//!
//! [[phases]]
//! name = "Foundation"
//! goal = "Prepare the platform"
//! agents = ["Nova"]
//! ```
//!
//! Settings are caller-owned values passed into the engine; nothing here is
//! process-global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use nova_contracts::{
    agent::{AgentBlueprint, AgentName, Phase, TaskSpec},
    error::{NovaError, NovaResult},
    report::ExecutionMode,
};

use crate::{planner::PhasePlan, registry::BlueprintRegistry};

const BUILTIN_MISSION: &str = include_str!("../../../missions/default.toml");

/// Run defaults. CLI flags override every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationSettings {
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Worker threads in parallel mode; defaults to the widest phase.
    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default = "default_message_capacity")]
    pub message_capacity: usize,
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,
}

fn default_message_capacity() -> usize {
    nova_hub::DEFAULT_CAPACITY
}

fn default_report_path() -> PathBuf {
    PathBuf::from("reports/orchestration_report.md")
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            max_workers: None,
            message_capacity: default_message_capacity(),
            report_path: default_report_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub name: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub agents: Vec<String>,
}

/// The top-level structure deserialized from a mission file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionConfig {
    #[serde(default)]
    pub orchestration: OrchestrationSettings,
    pub agents: Vec<BlueprintConfig>,
    pub phases: Vec<PhaseConfig>,
}

/// A validated registry and plan, ready to hand to the engine.
#[derive(Debug, Clone)]
pub struct Mission {
    pub registry: BlueprintRegistry,
    pub plan: PhasePlan,
    pub settings: OrchestrationSettings,
}

impl MissionConfig {
    /// Parse `s` as a TOML mission.
    pub fn from_toml_str(s: &str) -> NovaResult<Self> {
        toml::from_str(s).map_err(|e| NovaError::ConfigError {
            reason: format!("failed to parse mission TOML: {}", e),
        })
    }

    /// Read and parse the mission file at `path`.
    pub fn from_file(path: &Path) -> NovaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| NovaError::ConfigError {
            reason: format!("failed to read mission file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The mission shipped with the binary (`missions/default.toml`).
    pub fn builtin() -> NovaResult<Self> {
        Self::from_toml_str(BUILTIN_MISSION)
    }

    /// Register every blueprint and validate the phases against them.
    ///
    /// Fails on the first blueprint error (`EmptyBlueprint`,
    /// `DuplicateAgent`), otherwise with the planner's collected issues.
    pub fn build(&self) -> NovaResult<Mission> {
        if let Some(0) = self.orchestration.max_workers {
            return Err(NovaError::ConfigError {
                reason: "max_workers must be at least 1".to_string(),
            });
        }

        let mut registry = BlueprintRegistry::new();
        for agent in &self.agents {
            let blueprint =
                AgentBlueprint::new(agent.name.as_str(), agent.description.clone(), agent.tasks.clone())?
                    .with_dependencies(agent.depends_on.iter().map(AgentName::new).collect());
            registry.register(blueprint)?;
        }

        let phases = self
            .phases
            .iter()
            .map(|phase| Phase {
                name: phase.name.clone(),
                goal: phase.goal.clone(),
                agents: phase.agents.iter().map(AgentName::new).collect(),
            })
            .collect();
        let plan = PhasePlan::new(phases, &registry)?;

        debug!(
            agents = registry.len(),
            phases = plan.phases().len(),
            mode = %self.orchestration.mode,
            "mission built"
        );

        Ok(Mission {
            registry,
            plan,
            settings: self.orchestration.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use nova_contracts::{agent::AgentName, error::NovaError, report::ExecutionMode};

    use super::MissionConfig;

    const SMALL: &str = r#"
        [orchestration]
        mode = "parallel"
        max_workers = 2

        [[agents]]
        name = "Nova"
        description = "Infrastructure"

        [[agents.tasks]]
        name = "infrastructure-audit"
        steps = ["inventory", "report"]

        [[agents]]
        name = "Orion"
        depends_on = ["Nova"]

        [[agents.tasks]]
        name = "install-nemo"

        [[agents.tasks]]
        name = "select-llm"

        [[phases]]
        name = "Foundation"
        goal = "Platform"
        agents = ["Nova"]

        [[phases]]
        name = "Models"
        goal = "Model operations"
        agents = ["Orion"]
    "#;

    #[test]
    fn parses_and_builds_small_mission() {
        let config = MissionConfig::from_toml_str(SMALL).unwrap();
        assert_eq!(config.orchestration.mode, ExecutionMode::Parallel);
        assert_eq!(config.orchestration.max_workers, Some(2));
        assert_eq!(config.orchestration.message_capacity, nova_hub::DEFAULT_CAPACITY);

        let mission = config.build().unwrap();
        let orion = mission.registry.get(&AgentName::new("Orion")).unwrap();
        let tasks: Vec<&str> = orion.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tasks, vec!["install-nemo", "select-llm"]);
        assert_eq!(orion.depends_on(), &[AgentName::new("Nova")]);
        assert_eq!(mission.plan.phases().len(), 2);
    }

    #[test]
    fn agent_without_tasks_is_rejected() {
        let toml = r#"
            [[agents]]
            name = "Echo"

            [[phases]]
            name = "Experience"
            agents = ["Echo"]
        "#;
        match MissionConfig::from_toml_str(toml).unwrap().build() {
            Err(NovaError::EmptyBlueprint { agent }) => assert_eq!(agent, "Echo"),
            other => panic!("expected EmptyBlueprint, got {:?}", other),
        }
    }

    #[test]
    fn malformed_toml_is_config_error() {
        match MissionConfig::from_toml_str("[[agents]\nname = ") {
            Err(NovaError::ConfigError { reason }) => assert!(reason.contains("mission TOML")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn zero_workers_is_config_error() {
        let toml = SMALL.replace("max_workers = 2", "max_workers = 0");
        let config = MissionConfig::from_toml_str(&toml).unwrap();
        assert!(matches!(config.build(), Err(NovaError::ConfigError { .. })));
    }

    /// The shipped mission is a valid partition with dependencies on earlier phases.
    #[test]
    fn builtin_mission_is_valid() {
        let mission = MissionConfig::builtin().unwrap().build().unwrap();
        assert_eq!(mission.registry.len(), 6);
        let phases: Vec<&str> = mission.plan.phases().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            phases,
            vec!["Foundation", "Model Operations", "Data Services", "Experience", "Observability"]
        );
        assert_eq!(mission.plan.agent_order().len(), 6);
    }
}
