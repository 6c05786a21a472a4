//! The default task executor.

use serde_json::json;
use tracing::debug;

use nova_contracts::task::{TaskFailure, TaskOutput};

use crate::traits::{TaskContext, TaskExecutor};

/// Walks a task's steps and records each one as completed.
///
/// Never fails. A task without steps still completes, with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepwiseExecutor;

impl TaskExecutor for StepwiseExecutor {
    fn execute(&self, ctx: &TaskContext<'_>) -> Result<TaskOutput, TaskFailure> {
        let task = ctx.task;
        let mut output = TaskOutput::default();

        for step in &task.steps {
            debug!(agent = %ctx.agent, task = %task.name, step = %step, "step completed");
            output.details.push(format!("step-completed: {step}"));
        }
        if task.steps.is_empty() {
            output.warnings.push("Task has no defined steps.".to_string());
        }

        output.result = Some(json!({
            "steps_completed": task.steps.len(),
            "outputs": task.outputs,
        }));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use nova_contracts::agent::{AgentName, TaskSpec};

    use super::StepwiseExecutor;
    use crate::traits::{TaskContext, TaskExecutor};

    fn run(task: &TaskSpec) -> nova_contracts::task::TaskOutput {
        let agent = AgentName::new("Nova");
        let ctx = TaskContext {
            agent: &agent,
            phase: "Foundation",
            task,
            position: 0,
            prior: &[],
        };
        StepwiseExecutor.execute(&ctx).unwrap()
    }

    #[test]
    fn records_every_step_in_order() {
        let task = TaskSpec::new("container-platform", "Install runtime")
            .with_step("install docker")
            .with_step("enable gpu runtime");
        let output = run(&task);
        assert_eq!(
            output.details,
            vec!["step-completed: install docker", "step-completed: enable gpu runtime"]
        );
        assert!(output.warnings.is_empty());
        assert_eq!(output.result.unwrap()["steps_completed"], 2);
    }

    #[test]
    fn task_without_steps_warns() {
        let output = run(&TaskSpec::new("security-audit", ""));
        assert!(output.details.is_empty());
        assert_eq!(output.warnings, vec!["Task has no defined steps."]);
    }
}
