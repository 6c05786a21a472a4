//! Communication hub message types.
//!
//! Every message carries a typed payload; its category is derived from the
//! payload variant, so category and content can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{agent::AgentName, task::TaskStatus};

/// Who published a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Sender {
    Orchestrator,
    Agent(AgentName),
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Orchestrator => f.write_str("orchestrator"),
            Sender::Agent(name) => write!(f, "{name}"),
        }
    }
}

/// Who a message is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Recipient {
    Orchestrator,
    Agent(AgentName),
    Phase(String),
    /// Delivered to every recipient.
    Broadcast,
}

impl Recipient {
    /// True if a message addressed to `self` should be delivered to `target`.
    pub fn delivers_to(&self, target: &Recipient) -> bool {
        matches!(self, Recipient::Broadcast) || self == target
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Orchestrator => f.write_str("orchestrator"),
            Recipient::Agent(name) => write!(f, "{name}"),
            Recipient::Phase(name) => write!(f, "phase {name}"),
            Recipient::Broadcast => f.write_str("broadcast"),
        }
    }
}

/// Closed set of message categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCategory {
    PhaseStart,
    AgentStart,
    TaskStatus,
    AgentDone,
    PhaseEnd,
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MessageCategory::PhaseStart => "PHASE_START",
            MessageCategory::AgentStart => "AGENT_START",
            MessageCategory::TaskStatus => "TASK_STATUS",
            MessageCategory::AgentDone => "AGENT_DONE",
            MessageCategory::PhaseEnd => "PHASE_END",
        };
        f.write_str(label)
    }
}

/// Aggregate result of one agent's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentOutcome {
    /// Every task is `Done`.
    Success,
    /// At least one task is `Failed`.
    PartialFailure,
    /// Cancellation stopped the agent before all tasks ran.
    Cancelled,
    /// A fatal run error stopped the agent; finished tasks are kept.
    Aborted,
}

impl fmt::Display for AgentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentOutcome::Success => "success",
            AgentOutcome::PartialFailure => "partial failure",
            AgentOutcome::Cancelled => "cancelled",
            AgentOutcome::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// The result of an agent from an earlier phase, handed to later agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorOutcome {
    pub agent: AgentName,
    pub phase: String,
    pub outcome: AgentOutcome,
}

/// Typed message body, one variant per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePayload {
    PhaseStart {
        phase: String,
        goal: String,
        agents: Vec<AgentName>,
    },
    AgentStart {
        agent: AgentName,
        phase: String,
        task_count: usize,
        /// Dependencies declared in the agent's blueprint.
        depends_on: Vec<AgentName>,
        /// Every agent that finished in an earlier phase of this run.
        prior: Vec<PriorOutcome>,
    },
    TaskStatus {
        agent: AgentName,
        phase: String,
        task: String,
        status: TaskStatus,
        /// Failure reason, or the last progress line on success.
        detail: Option<String>,
    },
    AgentDone {
        agent: AgentName,
        phase: String,
        outcome: AgentOutcome,
        done: usize,
        failed: usize,
    },
    PhaseEnd {
        phase: String,
        done: usize,
        failed: usize,
    },
}

impl MessagePayload {
    pub fn category(&self) -> MessageCategory {
        match self {
            MessagePayload::PhaseStart { .. } => MessageCategory::PhaseStart,
            MessagePayload::AgentStart { .. } => MessageCategory::AgentStart,
            MessagePayload::TaskStatus { .. } => MessageCategory::TaskStatus,
            MessagePayload::AgentDone { .. } => MessageCategory::AgentDone,
            MessagePayload::PhaseEnd { .. } => MessageCategory::PhaseEnd,
        }
    }

    /// The phase this payload belongs to.
    pub fn phase(&self) -> &str {
        match self {
            MessagePayload::PhaseStart { phase, .. }
            | MessagePayload::AgentStart { phase, .. }
            | MessagePayload::TaskStatus { phase, .. }
            | MessagePayload::AgentDone { phase, .. }
            | MessagePayload::PhaseEnd { phase, .. } => phase,
        }
    }

    /// The agent this payload concerns, or `None` for phase-level messages.
    pub fn agent(&self) -> Option<&AgentName> {
        match self {
            MessagePayload::AgentStart { agent, .. }
            | MessagePayload::TaskStatus { agent, .. }
            | MessagePayload::AgentDone { agent, .. } => Some(agent),
            MessagePayload::PhaseStart { .. } | MessagePayload::PhaseEnd { .. } => None,
        }
    }
}

/// A message before the hub assigns its sequence number and hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub sender: Sender,
    pub recipient: Recipient,
    pub payload: MessagePayload,
}

/// An immutable entry in the communication log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Position in the log, starting at 0. The only clock a run uses.
    pub sequence: u64,
    pub sender: Sender,
    pub recipient: Recipient,
    pub payload: MessagePayload,
    /// Hash of the preceding message, or the genesis hash for the first.
    pub prev_hash: String,
    /// SHA-256 (hex) over run id, sequence, prev_hash and the message body.
    pub this_hash: String,
}

impl Message {
    pub fn category(&self) -> MessageCategory {
        self.payload.category()
    }

    /// The hash-relevant body of this message.
    pub fn draft(&self) -> MessageDraft {
        MessageDraft {
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            payload: self.payload.clone(),
        }
    }
}
