//! # nova-report
//!
//! Turns a finished `OrchestrationReport` into a Markdown document, and
//! exports reports as Markdown or JSON files.
//!
//! ```rust,ignore
//! let markdown = nova_report::render(&report);
//! nova_report::write_markdown(Path::new("reports/run.md"), &report)?;
//! ```

pub mod export;
pub mod markdown;

pub use export::{write_json, write_markdown};
pub use markdown::render;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use nova_contracts::{
        agent::{AgentBlueprint, AgentName, Phase, TaskSpec},
        error::NovaError,
        report::{ExecutionMode, OrchestrationReport},
        task::{TaskFailure, TaskOutput},
    };
    use nova_core::{
        traits::{TaskContext, TaskExecutor},
        BlueprintRegistry, CancellationToken, Orchestrator, PhasePlan, RunOptions,
    };

    use crate::{render, write_json, write_markdown};

    // ── Helpers ───────────────────────────────────────────────────────────────

    struct FailTask(&'static str);

    impl TaskExecutor for FailTask {
        fn execute(&self, ctx: &TaskContext<'_>) -> Result<TaskOutput, TaskFailure> {
            if ctx.task.name == self.0 {
                Err(TaskFailure::new("gpu quota exceeded"))
            } else {
                Ok(TaskOutput {
                    details: vec![format!("step-completed: {}", ctx.task.name)],
                    ..TaskOutput::default()
                })
            }
        }
    }

    fn orchestrator() -> Orchestrator {
        let mut registry = BlueprintRegistry::new();
        let agents: [(&str, &[&str]); 4] = [
            ("Nova", &["infrastructure-audit", "container-platform"]),
            ("Orion", &["install-nemo", "finetune-llm"]),
            ("Chronos", &["install-n8n"]),
            ("Aura", &["install-grafana"]),
        ];
        for (name, tasks) in agents {
            let tasks = tasks.iter().map(|t| TaskSpec::new(*t, "").with_step("run")).collect();
            registry.register(AgentBlueprint::new(name, "", tasks).unwrap()).unwrap();
        }
        let phase = |name: &str, agents: &[&str]| Phase {
            name: name.to_string(),
            goal: format!("{name} goal"),
            agents: agents.iter().map(|a| AgentName::new(*a)).collect(),
        };
        let plan = PhasePlan::new(
            vec![
                phase("Foundation", &["Nova"]),
                phase("Model Operations", &["Orion", "Chronos"]),
                phase("Observability", &["Aura"]),
            ],
            &registry,
        )
        .unwrap();
        Orchestrator::new(Arc::new(registry), Arc::new(plan))
    }

    fn options(mode: ExecutionMode) -> RunOptions {
        RunOptions::new(mode).with_started_at(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
    }

    fn run(mode: ExecutionMode) -> OrchestrationReport {
        orchestrator().run(&options(mode)).unwrap()
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_is_idempotent() {
        let report = run(ExecutionMode::Sequential);
        assert_eq!(render(&report), render(&report));
    }

    /// Two runs differ in run id and hashes, never in rendered content.
    #[test]
    fn test_render_is_identical_across_runs_and_modes() {
        let first = run(ExecutionMode::Sequential);
        let second = run(ExecutionMode::Sequential);
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(render(&first), render(&second));

        let mut parallel = run(ExecutionMode::Parallel);
        let parallel_text = render(&parallel);
        assert!(parallel_text.contains("- Execution mode: parallel"));

        // The mode line is the only difference.
        parallel.mode = ExecutionMode::Sequential;
        assert_eq!(render(&first), render(&parallel));
    }

    #[test]
    fn test_render_sections_in_order() {
        let text = render(&run(ExecutionMode::Sequential));
        let headings = [
            "# Nova Orchestration Report",
            "## Execution Plan",
            "## Phase 1: Foundation",
            "## Phase 2: Model Operations",
            "### Orion",
            "### Chronos",
            "## Phase 3: Observability",
            "## Phase Metrics",
            "## Summary",
            "## Failures",
            "## Governance Verdicts",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| text.find(h).unwrap_or_else(|| panic!("missing heading {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "headings out of order");

        assert!(text.contains("- Overall status: **SUCCESS**"));
        assert!(text.contains("- Started at: 2025-03-01 09:30:00 UTC"));
        assert!(text.contains("| Model Operations | 3 | 0 | 3 | 100% |"));
        assert!(text.contains("## Failures\n\n- None."));
        assert!(text.contains("- No policy decisions recorded."));
        assert!(!text.contains("sequence"));
        assert!(text.ends_with('\n') && !text.ends_with("\n\n"));
    }

    #[test]
    fn test_render_lists_every_failure() {
        let report = orchestrator()
            .with_executor(Box::new(FailTask("finetune-llm")))
            .run(&options(ExecutionMode::Parallel))
            .unwrap();
        let text = render(&report);

        assert!(text.contains("- Overall status: **PARTIAL_FAILURE**"));
        assert!(text.contains("- **Orion**: `finetune-llm` (gpu quota exceeded)"));
        assert!(text.contains("- TASK_STATUS `finetune-llm`: FAILED (gpu quota exceeded)"));
        assert!(text.contains("| Orion | Model Operations | 1 | 1 | partial failure |"));
        assert!(text.contains("| Model Operations | 2 | 1 | 3 | 67% |"));
    }

    #[test]
    fn test_render_cancelled_run_lists_unstarted_agents() {
        let token = CancellationToken::new();
        token.cancel();
        let report = orchestrator()
            .run(&options(ExecutionMode::Sequential).with_cancellation(token))
            .unwrap();
        let text = render(&report);

        assert!(text.contains("**RUN_CANCELLED**"));
        assert!(text.contains("- Not started: Nova, Orion, Chronos, Aura"));
        assert!(text.contains("- Phase did not start."));
    }

    #[test]
    fn test_render_failed_run_shows_reason() {
        let failure = orchestrator()
            .with_message_capacity(3)
            .run(&options(ExecutionMode::Sequential))
            .unwrap_err();
        let report = failure.report.expect("partial report");
        let text = render(&report);

        assert!(text.contains("**RUN_FAILED**"));
        assert!(text.contains("- Run aborted: message publish failed"));
        // Nova ran both tasks before its second TASK_STATUS was rejected.
        assert!(text.contains("| Nova | Foundation | 2 | 0 | aborted |"));
        assert!(text.contains("- Not started: Orion, Chronos, Aura"));
    }

    // ── Export ────────────────────────────────────────────────────────────────

    #[test]
    fn test_write_markdown_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested/run.md");
        let report = run(ExecutionMode::Sequential);

        write_markdown(&path, &report).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), render(&report));
    }

    #[test]
    fn test_write_json_keeps_full_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let report = run(ExecutionMode::Parallel);

        write_json(&path, &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["mode"], "parallel");
        assert_eq!(
            value["messages"].as_array().unwrap().len(),
            report.messages.len()
        );
        assert_eq!(value["messages"][0]["payload"]["category"], "PHASE_START");
    }

    #[test]
    fn test_write_to_unwritable_path_is_report_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("run.md");

        match write_markdown(&path, &run(ExecutionMode::Sequential)) {
            Err(NovaError::ReportWrite { path: written, .. }) => {
                assert!(written.ends_with("run.md"));
            }
            other => panic!("expected ReportWrite, got {:?}", other),
        }
    }
}
