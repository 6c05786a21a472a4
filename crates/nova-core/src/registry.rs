//! The blueprint registry: static catalog of agent roles.

use std::collections::HashMap;

use nova_contracts::{
    agent::{AgentBlueprint, AgentName},
    error::{NovaError, NovaResult},
};

/// Registered blueprints in registration order.
///
/// Mutated only by `register` during setup; read-only once a run starts, so
/// one registry may be shared by concurrent runs behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct BlueprintRegistry {
    blueprints: Vec<AgentBlueprint>,
    index: HashMap<AgentName, usize>,
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a blueprint. Fails with `DuplicateAgent` if the name is taken.
    pub fn register(&mut self, blueprint: AgentBlueprint) -> NovaResult<()> {
        if self.index.contains_key(blueprint.name()) {
            return Err(NovaError::DuplicateAgent {
                agent: blueprint.name().to_string(),
            });
        }
        self.index
            .insert(blueprint.name().clone(), self.blueprints.len());
        self.blueprints.push(blueprint);
        Ok(())
    }

    /// Look up a blueprint by name.
    pub fn get(&self, name: &AgentName) -> NovaResult<&AgentBlueprint> {
        self.index
            .get(name)
            .map(|&i| &self.blueprints[i])
            .ok_or_else(|| NovaError::UnknownAgent {
                agents: vec![name.to_string()],
            })
    }

    /// Every blueprint in registration order. Call again to restart.
    pub fn list_all(&self) -> std::slice::Iter<'_, AgentBlueprint> {
        self.blueprints.iter()
    }

    /// The blueprints named in `names`, in registration order.
    ///
    /// All-or-nothing: if any name is unknown, fails with `UnknownAgent`
    /// listing every missing name and returns nothing.
    pub fn subset(&self, names: &[AgentName]) -> NovaResult<Vec<&AgentBlueprint>> {
        let mut missing: Vec<String> = Vec::new();
        for name in names {
            if !self.contains(name) && !missing.iter().any(|m| m == name.as_str()) {
                missing.push(name.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(NovaError::UnknownAgent { agents: missing });
        }

        Ok(self
            .blueprints
            .iter()
            .filter(|bp| names.contains(bp.name()))
            .collect())
    }

    pub fn contains(&self, name: &AgentName) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &AgentName> {
        self.blueprints.iter().map(|bp| bp.name())
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}
