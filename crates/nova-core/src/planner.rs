//! The phase planner.
//!
//! Validation runs once, eagerly, when the plan is built. A `PhasePlan` that
//! exists is always a partition of the registry: every registered agent sits
//! in exactly one phase and every phase member is registered.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use nova_contracts::{
    agent::{AgentName, Phase},
    error::{NovaError, NovaResult, PlanningIssue},
};

use crate::registry::BlueprintRegistry;

/// An ordered, validated sequence of phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Phase>,
    /// Agent → index of its phase.
    membership: HashMap<AgentName, usize>,
}

impl PhasePlan {
    /// Validate `phases` against `registry`.
    ///
    /// Collects every mismatch before failing, so one `Planning` error
    /// describes the whole configuration.
    pub fn new(phases: Vec<Phase>, registry: &BlueprintRegistry) -> NovaResult<Self> {
        let mut issues = Vec::new();

        let mut seen_phases = HashSet::new();
        for phase in &phases {
            if !seen_phases.insert(phase.name.as_str()) {
                issues.push(PlanningIssue::DuplicatePhase {
                    phase: phase.name.clone(),
                });
            }
            if phase.agents.is_empty() {
                issues.push(PlanningIssue::EmptyPhase {
                    phase: phase.name.clone(),
                });
            }
        }

        // agent -> every phase it appears in, in plan order
        let mut placements: HashMap<&AgentName, Vec<usize>> = HashMap::new();
        for (index, phase) in phases.iter().enumerate() {
            for agent in &phase.agents {
                if !registry.contains(agent) {
                    issues.push(PlanningIssue::UnknownAgent {
                        phase: phase.name.clone(),
                        agent: agent.to_string(),
                    });
                }
                placements.entry(agent).or_default().push(index);
            }
        }

        // Report multiply-assigned agents in the order they first appear.
        let mut reported = HashSet::new();
        for phase in &phases {
            for agent in &phase.agents {
                let Some(indices) = placements.get(agent) else { continue };
                if indices.len() > 1 && reported.insert(agent) {
                    issues.push(PlanningIssue::MultiplyAssigned {
                        agent: agent.to_string(),
                        phases: indices.iter().map(|&i| phases[i].name.clone()).collect(),
                    });
                }
            }
        }

        for blueprint in registry.list_all() {
            let Some(own) = placements.get(blueprint.name()) else {
                issues.push(PlanningIssue::Unassigned {
                    agent: blueprint.name().to_string(),
                });
                continue;
            };
            for dependency in blueprint.depends_on() {
                let earlier = placements
                    .get(dependency)
                    .map(|dep| dep[0] < own[0])
                    .unwrap_or(false);
                if !registry.contains(dependency) || !earlier {
                    issues.push(PlanningIssue::DependencyNotEarlier {
                        agent: blueprint.name().to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }

        if !issues.is_empty() {
            return Err(NovaError::Planning { issues });
        }

        let membership = placements
            .into_iter()
            .map(|(agent, indices)| (agent.clone(), indices[0]))
            .collect();

        debug!(phases = phases.len(), agents = registry.len(), "phase plan validated");
        Ok(Self { phases, membership })
    }

    /// Phases in execution order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// The phase containing `agent`.
    pub fn phase_for_agent(&self, agent: &AgentName) -> NovaResult<&Phase> {
        self.membership
            .get(agent)
            .map(|&i| &self.phases[i])
            .ok_or_else(|| NovaError::UnassignedAgent {
                agent: agent.to_string(),
            })
    }

    /// Zero-based position of `agent`'s phase.
    pub fn phase_index(&self, agent: &AgentName) -> Option<usize> {
        self.membership.get(agent).copied()
    }

    /// Every agent in execution order: phase by phase, declared order within.
    pub fn agent_order(&self) -> Vec<&AgentName> {
        self.phases.iter().flat_map(|p| p.agents.iter()).collect()
    }

    /// Size of the largest phase.
    pub fn widest_phase(&self) -> usize {
        self.phases.iter().map(|p| p.agents.len()).max().unwrap_or(0)
    }

    /// The plan restricted to `agents`, dropping phases left empty.
    ///
    /// Fails with `UnknownAgent` naming every requested agent the plan does
    /// not contain. Phase order and declared agent order are preserved.
    pub fn filtered(&self, agents: &[AgentName]) -> NovaResult<PhasePlan> {
        let mut missing: Vec<String> = Vec::new();
        for agent in agents {
            if !self.membership.contains_key(agent) && !missing.iter().any(|m| m == agent.as_str())
            {
                missing.push(agent.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(NovaError::UnknownAgent { agents: missing });
        }

        let phases: Vec<Phase> = self
            .phases
            .iter()
            .filter_map(|phase| {
                let members: Vec<AgentName> = phase
                    .agents
                    .iter()
                    .filter(|a| agents.contains(a))
                    .cloned()
                    .collect();
                (!members.is_empty()).then(|| Phase {
                    name: phase.name.clone(),
                    goal: phase.goal.clone(),
                    agents: members,
                })
            })
            .collect();

        let membership = phases
            .iter()
            .enumerate()
            .flat_map(|(i, p)| p.agents.iter().map(move |a| (a.clone(), i)))
            .collect();

        Ok(PhasePlan { phases, membership })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use nova_contracts::{
        agent::{AgentBlueprint, AgentName, Phase, TaskSpec},
        error::{NovaError, PlanningIssue},
    };

    use super::PhasePlan;
    use crate::registry::BlueprintRegistry;

    fn blueprint(name: &str, deps: &[&str]) -> AgentBlueprint {
        AgentBlueprint::new(name, "", vec![TaskSpec::new("task", "")])
            .unwrap()
            .with_dependencies(deps.iter().map(|d| AgentName::new(*d)).collect())
    }

    fn phase(name: &str, agents: &[&str]) -> Phase {
        Phase {
            name: name.to_string(),
            goal: format!("{name} goal"),
            agents: agents.iter().map(|a| AgentName::new(*a)).collect(),
        }
    }

    fn registry(entries: &[(&str, &[&str])]) -> BlueprintRegistry {
        let mut registry = BlueprintRegistry::new();
        for (name, deps) in entries {
            registry.register(blueprint(name, deps)).unwrap();
        }
        registry
    }

    fn planning_issues(result: Result<PhasePlan, NovaError>) -> Vec<PlanningIssue> {
        match result {
            Err(NovaError::Planning { issues }) => issues,
            other => panic!("expected Planning error, got {:?}", other),
        }
    }

    /// Phase membership is exactly the registry's agent set.
    #[test]
    fn plan_partitions_registry() {
        let registry = registry(&[
            ("Nova", &[]),
            ("Orion", &["Nova"]),
            ("Chronos", &["Nova"]),
            ("Aura", &["Orion"]),
        ]);
        let plan = PhasePlan::new(
            vec![
                phase("Foundation", &["Nova"]),
                phase("Models", &["Orion", "Chronos"]),
                phase("Observability", &["Aura"]),
            ],
            &registry,
        )
        .unwrap();

        let planned: Vec<&AgentName> = plan.agent_order();
        let unique: BTreeSet<&AgentName> = planned.iter().copied().collect();
        let registered: BTreeSet<&AgentName> = registry.names().collect();
        assert_eq!(planned.len(), unique.len(), "no agent planned twice");
        assert_eq!(unique, registered);

        assert_eq!(plan.phase_for_agent(&AgentName::new("Chronos")).unwrap().name, "Models");
        assert_eq!(plan.phase_index(&AgentName::new("Aura")), Some(2));
        assert_eq!(plan.widest_phase(), 2);
    }

    /// An agent in the registry but in no phase is reported as unassigned.
    #[test]
    fn unassigned_agent_is_planning_error() {
        let registry = registry(&[("Nova", &[]), ("Echo", &[])]);
        let issues = planning_issues(PhasePlan::new(vec![phase("Foundation", &["Nova"])], &registry));
        assert_eq!(
            issues,
            vec![PlanningIssue::Unassigned { agent: "Echo".to_string() }]
        );
        let message = NovaError::Planning { issues }.to_string();
        assert!(message.contains("Echo"), "unexpected message: {message}");
    }

    #[test]
    fn every_mismatch_is_collected() {
        let registry = registry(&[("Nova", &[]), ("Orion", &[]), ("Echo", &[])]);
        let issues = planning_issues(PhasePlan::new(
            vec![
                phase("Foundation", &["Nova", "Ghost"]),
                phase("Models", &["Orion", "Nova"]),
                phase("Empty", &[]),
                phase("Models", &["Orion"]),
            ],
            &registry,
        ));

        assert!(issues.contains(&PlanningIssue::UnknownAgent {
            phase: "Foundation".to_string(),
            agent: "Ghost".to_string(),
        }));
        assert!(issues.contains(&PlanningIssue::MultiplyAssigned {
            agent: "Nova".to_string(),
            phases: vec!["Foundation".to_string(), "Models".to_string()],
        }));
        assert!(issues.contains(&PlanningIssue::EmptyPhase { phase: "Empty".to_string() }));
        assert!(issues.contains(&PlanningIssue::DuplicatePhase { phase: "Models".to_string() }));
        assert!(issues.contains(&PlanningIssue::Unassigned { agent: "Echo".to_string() }));
    }

    #[test]
    fn dependency_must_run_in_earlier_phase() {
        let registry = registry(&[("Nova", &["Orion"]), ("Orion", &[]), ("Aura", &["Ghost"])]);
        let issues = planning_issues(PhasePlan::new(
            vec![phase("Foundation", &["Nova", "Orion"]), phase("Later", &["Aura"])],
            &registry,
        ));
        assert_eq!(
            issues,
            vec![
                PlanningIssue::DependencyNotEarlier {
                    agent: "Nova".to_string(),
                    dependency: "Orion".to_string(),
                },
                PlanningIssue::DependencyNotEarlier {
                    agent: "Aura".to_string(),
                    dependency: "Ghost".to_string(),
                },
            ]
        );
    }

    #[test]
    fn phase_for_unknown_agent_is_unassigned() {
        let registry = registry(&[("Nova", &[])]);
        let plan = PhasePlan::new(vec![phase("Foundation", &["Nova"])], &registry).unwrap();
        match plan.phase_for_agent(&AgentName::new("Ghost")) {
            Err(NovaError::UnassignedAgent { agent }) => assert_eq!(agent, "Ghost"),
            other => panic!("expected UnassignedAgent, got {:?}", other),
        }
    }

    #[test]
    fn filtered_drops_empty_phases_and_keeps_order() {
        let registry = registry(&[("Nova", &[]), ("Orion", &[]), ("Chronos", &[]), ("Aura", &[])]);
        let plan = PhasePlan::new(
            vec![
                phase("Foundation", &["Nova"]),
                phase("Models", &["Orion", "Chronos"]),
                phase("Observability", &["Aura"]),
            ],
            &registry,
        )
        .unwrap();

        let filtered = plan
            .filtered(&[AgentName::new("Aura"), AgentName::new("Chronos"), AgentName::new("Orion")])
            .unwrap();
        let names: Vec<&str> = filtered.phases().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Models", "Observability"]);
        let order: Vec<&str> = filtered.agent_order().iter().map(|a| a.as_str()).collect();
        assert_eq!(order, vec!["Orion", "Chronos", "Aura"]);
        assert_eq!(filtered.phase_index(&AgentName::new("Aura")), Some(1));
        assert!(filtered.phase_for_agent(&AgentName::new("Nova")).is_err());
    }

    #[test]
    fn filtered_rejects_unknown_agents() {
        let registry = registry(&[("Nova", &[])]);
        let plan = PhasePlan::new(vec![phase("Foundation", &["Nova"])], &registry).unwrap();
        match plan.filtered(&[AgentName::new("Nova"), AgentName::new("Ghost")]) {
            Err(NovaError::UnknownAgent { agents }) => assert_eq!(agents, vec!["Ghost"]),
            other => panic!("expected UnknownAgent, got {:?}", other),
        }
    }
}
