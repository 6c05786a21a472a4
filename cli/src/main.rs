//! Nova orchestrator CLI.
//!
//! Runs the mission's agents phase by phase and writes the Markdown report.
//!
//! Usage:
//!   cargo run -p nova-cli -- orchestrate
//!   cargo run -p nova-cli -- orchestrate --mode parallel --agents Nova,Orion
//!   cargo run -p nova-cli -- orchestrate --fail Orion/finetune-llm --json reports/run.json
//!   cargo run -p nova-cli -- plan
//!   cargo run -p nova-cli -- agents

mod fault;

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nova_contracts::{
    agent::AgentName,
    error::NovaResult,
    report::{ExecutionMode, OrchestrationReport},
};
use nova_core::{Mission, MissionConfig, Orchestrator, RunFailure, RunOptions};
use nova_policy::TomlPolicyEngine;

use crate::fault::FailureInjectingExecutor;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Nova: phase-ordered orchestration of specialist agents.
#[derive(Parser)]
#[command(
    name = "nova",
    about = "Nova multi-agent orchestrator",
    long_about = "Runs Nova's specialist agents phase by phase, records every message\n\
                  in a hash-chained log, and writes a Markdown report."
)]
struct Cli {
    /// Mission file to load instead of the built-in mission.
    #[arg(long, global = true, value_name = "FILE")]
    mission: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the mission and write the report.
    Orchestrate(OrchestrateArgs),
    /// Print the phase plan.
    Plan,
    /// List the registered agent blueprints.
    Agents,
}

#[derive(Args)]
struct OrchestrateArgs {
    /// Only run these agents (comma separated).
    #[arg(long, value_delimiter = ',', value_name = "AGENTS")]
    agents: Vec<String>,

    /// Dispatch mode for agents within a phase.
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Worker threads in parallel mode.
    #[arg(long)]
    max_workers: Option<usize>,

    /// Markdown report path.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also write the full report as JSON.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Authorize every task against this policy file.
    #[arg(long, value_name = "FILE", conflicts_with = "default_policy")]
    policy: Option<PathBuf>,

    /// Authorize every task against the built-in policy.
    #[arg(long)]
    default_policy: bool,

    /// Make AGENT/TASK fail (repeatable).
    #[arg(long = "fail", value_name = "AGENT/TASK")]
    fail: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Sequential,
    Parallel,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sequential => ExecutionMode::Sequential,
            Mode::Parallel => ExecutionMode::Parallel,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Set RUST_LOG=debug for per-message output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let mission = match load_mission(&cli) {
        Ok(mission) => mission,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Orchestrate(args) => orchestrate(mission, args),
        Command::Plan => {
            print_plan(&mission);
            ExitCode::SUCCESS
        }
        Command::Agents => {
            print_agents(&mission);
            ExitCode::SUCCESS
        }
    }
}

fn load_mission(cli: &Cli) -> NovaResult<Mission> {
    let config = match &cli.mission {
        Some(path) => MissionConfig::from_file(path)?,
        None => MissionConfig::builtin()?,
    };
    let mission = config.build()?;
    info!(
        agents = mission.registry.len(),
        phases = mission.plan.phases().len(),
        "mission loaded"
    );
    Ok(mission)
}

// ── orchestrate ───────────────────────────────────────────────────────────────

fn orchestrate(mission: Mission, args: OrchestrateArgs) -> ExitCode {
    let settings = mission.settings.clone();
    let orchestrator = match build_orchestrator(mission, &args) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut options = RunOptions::new(args.mode.map(Into::into).unwrap_or(settings.mode));
    if !args.agents.is_empty() {
        options = options.with_agents(args.agents.iter().map(|a| AgentName::new(a.trim())).collect());
    }
    if let Some(workers) = args.max_workers.or(settings.max_workers) {
        options = options.with_max_workers(workers);
    }

    let output = args.output.clone().unwrap_or(settings.report_path);

    match orchestrator.run(&options) {
        Ok(report) => {
            if let Err(e) = export(&report, &output, args.json.as_deref()) {
                eprintln!("Report error: {}", e);
                return ExitCode::FAILURE;
            }
            print_outcome(&report, &output);
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(RunFailure { error, report: Some(report) }) => {
            eprintln!("Run failed: {}", error);
            if let Err(e) = export(&report, &output, args.json.as_deref()) {
                eprintln!("Report error: {}", e);
            } else {
                print_outcome(&report, &output);
            }
            ExitCode::FAILURE
        }
        Err(RunFailure { error, report: None }) => {
            eprintln!("Configuration error: {}", error);
            ExitCode::from(2)
        }
    }
}

fn build_orchestrator(mission: Mission, args: &OrchestrateArgs) -> NovaResult<Orchestrator> {
    let capacity = mission.settings.message_capacity;
    let mut orchestrator = Orchestrator::new(Arc::new(mission.registry), Arc::new(mission.plan))
        .with_message_capacity(capacity);

    if !args.fail.is_empty() {
        orchestrator =
            orchestrator.with_executor(Box::new(FailureInjectingExecutor::from_specs(&args.fail)?));
    }

    if let Some(path) = &args.policy {
        orchestrator = orchestrator.with_policy(Box::new(TomlPolicyEngine::from_file(path)?));
    } else if args.default_policy {
        orchestrator = orchestrator.with_policy(Box::new(TomlPolicyEngine::builtin()?));
    }

    Ok(orchestrator)
}

fn export(report: &OrchestrationReport, markdown: &Path, json: Option<&Path>) -> NovaResult<()> {
    nova_report::write_markdown(markdown, report)?;
    if let Some(path) = json {
        nova_report::write_json(path, report)?;
    }
    Ok(())
}

fn print_outcome(report: &OrchestrationReport, output: &Path) {
    println!();
    println!("Run status: {}", report.status);
    for metrics in report.phase_metrics() {
        println!(
            "  {:<20} {:>3} done  {:>3} failed  ({}%)",
            metrics.phase,
            metrics.done,
            metrics.failed,
            metrics.percent_done()
        );
    }
    let failed = report.failed_tasks();
    if !failed.is_empty() {
        println!();
        println!("Failed tasks:");
        for (agent, task) in failed {
            println!("  {}/{}", agent, task);
        }
    }
    println!();
    println!("Report written to {}", output.display());
}

// ── plan / agents ─────────────────────────────────────────────────────────────

fn print_plan(mission: &Mission) {
    println!("Execution plan ({} phases):", mission.plan.phases().len());
    for (index, phase) in mission.plan.phases().iter().enumerate() {
        println!();
        println!("{}. {}: {}", index + 1, phase.name, phase.goal);
        for agent in &phase.agents {
            let deps = mission
                .registry
                .get(agent)
                .map(|bp| bp.depends_on().to_vec())
                .unwrap_or_default();
            if deps.is_empty() {
                println!("   - {}", agent);
            } else {
                let deps: Vec<&str> = deps.iter().map(AgentName::as_str).collect();
                println!("   - {} (after {})", agent, deps.join(", "));
            }
        }
    }
}

fn print_agents(mission: &Mission) {
    for blueprint in mission.registry.list_all() {
        println!("{}: {}", blueprint.name(), blueprint.description());
        for task in blueprint.tasks() {
            println!("  - {} ({} steps)", task.name, task.steps.len());
        }
    }
}
