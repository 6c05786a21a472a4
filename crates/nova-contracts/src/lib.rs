//! # nova-contracts
//!
//! Shared types, message payloads, and errors for the Nova orchestrator.
//!
//! All crates in the workspace import from here. No orchestration logic lives
//! in this crate, only data definitions and the invariants they enforce on
//! themselves (non-empty blueprints, forward-only task and run transitions).

pub mod agent;
pub mod error;
pub mod message;
pub mod policy;
pub mod report;
pub mod task;
