//! Policy rule types and configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML and holds an ordered list of
//! `PolicyRule`s. Rules are evaluated in declaration order; the first
//! matching rule wins. If no rule matches, the engine denies by default.

use serde::{Deserialize, Serialize};

/// The decision a rule produces when it matches.
///
/// ```toml
/// verdict = "allow"
/// verdict = "deny"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleVerdict {
    Allow,
    Deny,
}

/// A single policy rule loaded from TOML.
///
/// `subject`, `action` and `resource` each accept the wildcard `"*"`.
/// `subject` may be omitted, in which case it matches every agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Stable identifier, quoted in decision reasons.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Agent name pattern.
    #[serde(default = "wildcard")]
    pub subject: String,

    /// Action pattern, e.g. `"execute-task"`.
    pub action: String,

    /// Resource pattern, e.g. a task name.
    pub resource: String,

    pub verdict: RuleVerdict,

    /// Explanation recorded with the decision. Defaults to naming the rule.
    pub reason: Option<String>,
}

fn wildcard() -> String {
    "*".to_string()
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    pattern == "*" || pattern == value
}

impl PolicyRule {
    /// Exact, case-sensitive match on each field unless the field is `"*"`.
    pub fn matches(&self, subject: &str, action: &str, resource: &str) -> bool {
        pattern_matches(&self.subject, subject)
            && pattern_matches(&self.action, action)
            && pattern_matches(&self.resource, resource)
    }

    /// The reason recorded when this rule decides a request.
    pub fn decision_reason(&self) -> String {
        self.reason.clone().unwrap_or_else(|| match self.verdict {
            RuleVerdict::Allow => format!("allowed by rule '{}'", self.id),
            RuleVerdict::Deny => format!("denied by rule '{}'", self.id),
        })
    }
}

/// The top-level structure deserialized from a TOML policy file.
///
/// ```toml
/// [[rules]]
/// id = "allow-task-execution"
/// description = "Agents may run the tasks in their blueprints"
/// action = "execute-task"
/// resource = "*"
/// verdict = "allow"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Ordered list of rules. First match wins.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}
