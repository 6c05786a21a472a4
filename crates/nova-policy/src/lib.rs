//! # nova-policy
//!
//! A TOML-driven, deny-by-default policy engine for Nova orchestration runs.
//!
//! ## Overview
//!
//! [`TomlPolicyEngine`] implements the
//! [`PolicyEngine`](nova_core::traits::PolicyEngine) trait. Rules are declared
//! in a TOML file, evaluated in order, and the first matching rule wins. If no
//! rule matches, the request is denied.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use nova_policy::TomlPolicyEngine;
//!
//! let engine = TomlPolicyEngine::from_file(Path::new("policies/default.toml"))?;
//! // Pass `Box::new(engine)` to `Orchestrator::with_policy`.
//! ```
//!
//! ## Rule matching
//!
//! Each rule specifies `subject`, `action` and `resource` patterns. All
//! support the wildcard `"*"`; `subject` defaults to it.

pub mod engine;
pub mod rule;

pub use engine::TomlPolicyEngine;
pub use rule::{PolicyConfig, PolicyRule, RuleVerdict};

// ── Tests ─────────────────────────────────────────────────────────────────────
