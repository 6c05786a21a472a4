//! TOML-driven policy engine implementation.
//!
//! Evaluation algorithm:
//!
//! 1. Iterate rules in declaration order.
//! 2. The first rule whose `subject`, `action` and `resource` patterns match
//!    decides the request.
//! 3. If no rule matched, deny with "denied by default".

use std::path::Path;

use tracing::{debug, warn};

use nova_contracts::{
    error::{NovaError, NovaResult},
    policy::{PolicyDecision, PolicyRequest},
};
use nova_core::traits::PolicyEngine;

use crate::rule::{PolicyConfig, PolicyRule, RuleVerdict};

const BUILTIN_POLICY: &str = include_str!("../../../policies/default.toml");

/// A `PolicyEngine` that reads rules from a TOML document.
///
/// ```rust,ignore
/// use nova_policy::TomlPolicyEngine;
///
/// let engine = TomlPolicyEngine::from_file(Path::new("policies/default.toml"))?;
/// let orchestrator = orchestrator.with_policy(Box::new(engine));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlPolicyEngine {
    config: PolicyConfig,
}

impl TomlPolicyEngine {
    /// Parse `s` as TOML policy configuration.
    ///
    /// Returns `NovaError::ConfigError` if the TOML is malformed or does not
    /// match `PolicyConfig`.
    pub fn from_toml_str(s: &str) -> NovaResult<Self> {
        let config: PolicyConfig = toml::from_str(s).map_err(|e| NovaError::ConfigError {
            reason: format!("failed to parse policy TOML: {}", e),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as TOML policy configuration.
    pub fn from_file(path: &Path) -> NovaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| NovaError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The policy shipped with the binary (`policies/default.toml`).
    pub fn builtin() -> NovaResult<Self> {
        Self::from_toml_str(BUILTIN_POLICY)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.config.rules
    }
}

impl PolicyEngine for TomlPolicyEngine {
    fn authorize(&self, request: &PolicyRequest) -> NovaResult<PolicyDecision> {
        debug!(
            subject = %request.subject,
            action = %request.action,
            resource = %request.resource,
            "evaluating policy"
        );

        let matched = self
            .config
            .rules
            .iter()
            .find(|rule| rule.matches(&request.subject, &request.action, &request.resource));

        let Some(rule) = matched else {
            warn!(
                subject = %request.subject,
                action = %request.action,
                resource = %request.resource,
                "no policy rule matched; denying by default"
            );
            return Ok(PolicyDecision::deny(format!(
                "denied by default: no policy rule matched action '{}' on resource '{}'",
                request.action, request.resource
            )));
        };

        debug!(rule_id = %rule.id, verdict = ?rule.verdict, "rule matched");
        Ok(match rule.verdict {
            RuleVerdict::Allow => PolicyDecision::allow(rule.decision_reason()),
            RuleVerdict::Deny => PolicyDecision::deny(rule.decision_reason()),
        })
    }
}
