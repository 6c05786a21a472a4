//! Markdown rendering of an `OrchestrationReport`.
//!
//! Rendering is a pure function of the report. Sequence numbers, the run id
//! and hashes are left out, so two logically identical runs started at the
//! same instant render the same document.

use nova_contracts::{
    agent::{AgentName, Phase},
    message::{Message, MessagePayload},
    report::OrchestrationReport,
    task::TaskStatus,
};

/// Render `report` as a Markdown document.
pub fn render(report: &OrchestrationReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Nova Orchestration Report".to_string());
    lines.push(String::new());
    lines.push(format!("- Overall status: **{}**", report.status));
    lines.push(format!("- Execution mode: {}", report.mode));
    lines.push(format!(
        "- Started at: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(String::new());

    render_plan(report, &mut lines);
    for (index, phase) in report.phases.iter().enumerate() {
        render_phase(report, index, phase, &mut lines);
    }
    render_metrics(report, &mut lines);
    render_summary(report, &mut lines);
    render_failures(report, &mut lines);
    render_governance(report, &mut lines);

    let mut out = lines.join("\n");
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

// ── Sections ──────────────────────────────────────────────────────────────────

fn render_plan(report: &OrchestrationReport, lines: &mut Vec<String>) {
    lines.push("## Execution Plan".to_string());
    lines.push(String::new());
    if report.phases.is_empty() {
        lines.push("- No phases planned.".to_string());
    }
    for (index, phase) in report.phases.iter().enumerate() {
        lines.push(format!("{}. **{}**: {}", index + 1, phase.name, phase.goal));
        lines.push(format!("   - Agents: {}", join_names(&phase.agents)));
    }
    lines.push(String::new());
}

fn render_phase(report: &OrchestrationReport, index: usize, phase: &Phase, lines: &mut Vec<String>) {
    lines.push(format!("## Phase {}: {}", index + 1, phase.name));
    lines.push(String::new());
    lines.push(format!("Goal: {}", phase.goal));
    lines.push(String::new());

    let in_phase = |m: &&Message| m.payload.phase() == phase.name;

    let phase_events: Vec<String> = report
        .messages
        .iter()
        .filter(in_phase)
        .filter(|m| m.payload.agent().is_none())
        .map(describe)
        .collect();
    if phase_events.is_empty() {
        lines.push("- Phase did not start.".to_string());
    }
    lines.extend(phase_events);

    for agent in &phase.agents {
        lines.push(String::new());
        lines.push(format!("### {}", agent));
        lines.push(String::new());
        let events: Vec<String> = report
            .messages
            .iter()
            .filter(in_phase)
            .filter(|m| m.payload.agent() == Some(agent))
            .map(describe)
            .collect();
        if events.is_empty() {
            lines.push("- Not started.".to_string());
        }
        lines.extend(events);
    }
    lines.push(String::new());
}

fn render_metrics(report: &OrchestrationReport, lines: &mut Vec<String>) {
    lines.push("## Phase Metrics".to_string());
    lines.push(String::new());
    lines.push("| Phase | Done | Failed | Total | Complete |".to_string());
    lines.push("|---|---:|---:|---:|---:|".to_string());
    for metrics in report.phase_metrics() {
        lines.push(format!(
            "| {} | {} | {} | {} | {}% |",
            metrics.phase,
            metrics.done,
            metrics.failed,
            metrics.total,
            metrics.percent_done()
        ));
    }
    lines.push(String::new());
}

fn render_summary(report: &OrchestrationReport, lines: &mut Vec<String>) {
    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push("| Agent | Phase | Done | Failed | Outcome |".to_string());
    lines.push("|---|---|---:|---:|---|".to_string());
    for run in &report.agents {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            run.agent,
            run.phase,
            run.done(),
            run.failed(),
            run.outcome
        ));
    }
    lines.push(String::new());
    lines.push(format!("Overall status: **{}**", report.status));
    lines.push(String::new());
}

fn render_failures(report: &OrchestrationReport, lines: &mut Vec<String>) {
    lines.push("## Failures".to_string());
    lines.push(String::new());

    let mut any = false;
    if let Some(reason) = &report.failure {
        lines.push(format!("- Run aborted: {}", reason));
        any = true;
    }
    for run in &report.agents {
        for task in run.tasks.iter().filter(|t| t.status == TaskStatus::Failed) {
            let reason = task.failure.as_deref().unwrap_or("no reason given");
            lines.push(format!("- **{}**: `{}` ({})", run.agent, task.name, reason));
            any = true;
        }
    }

    let not_started: Vec<&AgentName> = report
        .phases
        .iter()
        .flat_map(|p| p.agents.iter())
        .filter(|a| report.agent_run(a).is_none())
        .collect();
    if !not_started.is_empty() {
        lines.push(format!(
            "- Not started: {}",
            not_started.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ")
        ));
        any = true;
    }

    if !any {
        lines.push("- None.".to_string());
    }
    lines.push(String::new());
}

fn render_governance(report: &OrchestrationReport, lines: &mut Vec<String>) {
    lines.push("## Governance Verdicts".to_string());
    lines.push(String::new());

    let mut any = false;
    for record in report.governance() {
        let verdict = if record.decision.allow { "ALLOW" } else { "DENY" };
        lines.push(format!(
            "- {} {} {} `{}`: {}",
            verdict,
            record.request.subject,
            record.request.action,
            record.request.resource,
            record.decision.reason
        ));
        any = true;
    }
    if !any {
        lines.push("- No policy decisions recorded.".to_string());
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn describe(message: &Message) -> String {
    let category = message.category();
    match &message.payload {
        MessagePayload::PhaseStart { agents, .. } => {
            format!("- {category}: agents {}", join_names(agents))
        }
        MessagePayload::AgentStart {
            task_count,
            depends_on,
            prior,
            ..
        } => {
            let mut line = format!("- {category}: {task_count} task(s)");
            if !depends_on.is_empty() {
                line.push_str(&format!("; depends on {}", join_names(depends_on)));
            }
            if !prior.is_empty() {
                let results: Vec<String> = prior
                    .iter()
                    .map(|p| format!("{} ({})", p.agent, p.outcome))
                    .collect();
                line.push_str(&format!("; prior results: {}", results.join(", ")));
            }
            line
        }
        MessagePayload::TaskStatus {
            task, status, detail, ..
        } => match detail {
            Some(detail) => format!("- {category} `{task}`: {status} ({detail})"),
            None => format!("- {category} `{task}`: {status}"),
        },
        MessagePayload::AgentDone {
            outcome, done, failed, ..
        } => format!("- {category}: {outcome} ({done} done, {failed} failed)"),
        MessagePayload::PhaseEnd { done, failed, .. } => {
            format!("- {category}: {done} done, {failed} failed")
        }
    }
}

fn join_names(names: &[AgentName]) -> String {
    if names.is_empty() {
        return "none".to_string();
    }
    names.iter().map(AgentName::as_str).collect::<Vec<_>>().join(", ")
}
