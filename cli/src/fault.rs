//! Task failure injection for demonstrations.

use nova_contracts::{
    agent::AgentName,
    error::{NovaError, NovaResult},
    task::{TaskFailure, TaskOutput},
};
use nova_core::{
    traits::{TaskContext, TaskExecutor},
    StepwiseExecutor,
};

/// Wraps [`StepwiseExecutor`], failing the listed `(agent, task)` pairs.
pub struct FailureInjectingExecutor {
    inner: StepwiseExecutor,
    targets: Vec<(AgentName, String)>,
}

impl FailureInjectingExecutor {
    /// Parse `AGENT/TASK` specs, e.g. `Orion/finetune-llm`.
    pub fn from_specs(specs: &[String]) -> NovaResult<Self> {
        let targets = specs
            .iter()
            .map(|spec| match spec.split_once('/') {
                Some((agent, task)) if !agent.is_empty() && !task.is_empty() => {
                    Ok((AgentName::new(agent), task.to_string()))
                }
                _ => Err(NovaError::ConfigError {
                    reason: format!("invalid --fail value '{spec}', expected AGENT/TASK"),
                }),
            })
            .collect::<NovaResult<Vec<_>>>()?;
        Ok(Self {
            inner: StepwiseExecutor,
            targets,
        })
    }
}

impl TaskExecutor for FailureInjectingExecutor {
    fn execute(&self, ctx: &TaskContext<'_>) -> Result<TaskOutput, TaskFailure> {
        let targeted = self
            .targets
            .iter()
            .any(|(agent, task)| agent == ctx.agent && task == &ctx.task.name);
        if targeted {
            return Err(TaskFailure::new(format!(
                "failure injected for {}/{}",
                ctx.agent, ctx.task.name
            )));
        }
        self.inner.execute(ctx)
    }
}

#[cfg(test)]
mod tests {
    use nova_contracts::{
        agent::{AgentName, TaskSpec},
        error::NovaError,
    };
    use nova_core::traits::{TaskContext, TaskExecutor};

    use super::FailureInjectingExecutor;

    #[test]
    fn fails_only_targeted_task() {
        let executor =
            FailureInjectingExecutor::from_specs(&["Orion/finetune-llm".to_string()]).unwrap();
        let orion = AgentName::new("Orion");
        let finetune = TaskSpec::new("finetune-llm", "");
        let select = TaskSpec::new("select-llm", "").with_step("benchmark");

        let ctx = |task| TaskContext {
            agent: &orion,
            phase: "Model Operations",
            task,
            position: 0,
            prior: &[],
        };

        let failure = executor.execute(&ctx(&finetune)).unwrap_err();
        assert_eq!(failure.reason, "failure injected for Orion/finetune-llm");
        let output = executor.execute(&ctx(&select)).unwrap();
        assert_eq!(output.details, vec!["step-completed: benchmark"]);
    }

    #[test]
    fn rejects_malformed_spec() {
        for bad in ["Orion", "/task", "Orion/"] {
            match FailureInjectingExecutor::from_specs(&[bad.to_string()]) {
                Err(NovaError::ConfigError { reason }) => assert!(reason.contains(bad)),
                Err(other) => panic!("expected ConfigError, got {:?}", other),
                Ok(_) => panic!("expected ConfigError for {bad}"),
            }
        }
    }
}
