//! # nova-core
//!
//! The blueprint registry, phase planner, and orchestration engine for Nova.
//!
//! This crate provides:
//! - `BlueprintRegistry` and `PhasePlan`, validated eagerly at setup
//! - The `TaskExecutor` and `PolicyEngine` trait seams
//! - The `Orchestrator`, which runs phases in order and produces an
//!   `OrchestrationReport`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nova_core::{MissionConfig, Orchestrator, RunOptions};
//!
//! let mission = MissionConfig::builtin()?.build()?;
//! let orchestrator = Orchestrator::new(Arc::new(mission.registry), Arc::new(mission.plan));
//! let report = orchestrator.run(&RunOptions::new(ExecutionMode::Parallel))?;
//! ```

pub mod cancel;
pub mod config;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod pool;
pub mod registry;
pub mod traits;

pub use cancel::CancellationToken;
pub use config::{Mission, MissionConfig, OrchestrationSettings};
pub use executor::StepwiseExecutor;
pub use orchestrator::{Orchestrator, RunFailure, RunOptions, EXECUTE_TASK};
pub use planner::PhasePlan;
pub use pool::WorkerPool;
pub use registry::BlueprintRegistry;

// ── Tests ─────────────────────────────────────────────────────────────────────
