//! # nova-hub
//!
//! The communication hub for Nova orchestration runs: an append-only,
//! SHA-256 hash-chained, in-memory message log.
//!
//! ## Overview
//!
//! Every message the engine or an agent publishes is assigned the next
//! sequence number and linked to its predecessor by hash. Messages are never
//! deleted or reordered; tampering with any stored message breaks the chain
//! and is detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nova_hub::CommunicationHub;
//!
//! let hub = CommunicationHub::new(run_id);
//! hub.publish(draft)?;
//! for message in hub.for_recipient(Recipient::Agent("Nova".into())).iter() {
//!     // ...
//! }
//! assert!(hub.verify_integrity());
//! ```

pub mod chain;
pub mod hub;
pub mod view;

pub use chain::{hash_message, verify_chain, GENESIS_HASH};
pub use hub::{CommunicationHub, DEFAULT_CAPACITY};
pub use view::{MessageLog, RecipientView};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nova_contracts::{
        agent::AgentName,
        error::NovaError,
        message::{MessageCategory, MessageDraft, MessagePayload, Recipient, Sender},
        report::RunId,
    };

    use super::{verify_chain, CommunicationHub, GENESIS_HASH};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn phase_start(phase: &str) -> MessageDraft {
        MessageDraft {
            sender: Sender::Orchestrator,
            recipient: Recipient::Broadcast,
            payload: MessagePayload::PhaseStart {
                phase: phase.to_string(),
                goal: "baseline".to_string(),
                agents: vec![AgentName::new("Nova")],
            },
        }
    }

    fn agent_start(agent: &str) -> MessageDraft {
        MessageDraft {
            sender: Sender::Orchestrator,
            recipient: Recipient::Agent(AgentName::new(agent)),
            payload: MessagePayload::AgentStart {
                agent: AgentName::new(agent),
                phase: "Foundation".to_string(),
                task_count: 1,
                depends_on: vec![],
                prior: vec![],
            },
        }
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    /// Sequence numbers are 0, 1, 2, … and the first message links to genesis.
    #[test]
    fn test_sequence_and_genesis() {
        let hub = CommunicationHub::new(RunId::new());
        let first = hub.publish(phase_start("Foundation")).unwrap();
        let second = hub.publish(agent_start("Nova")).unwrap();

        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
        assert_eq!(first.prev_hash, GENESIS_HASH);
        assert_eq!(second.prev_hash, first.this_hash);
        assert_eq!(hub.terminal_hash(), second.this_hash);
    }

    /// Broadcasts reach everyone; directed messages reach only their target.
    #[test]
    fn test_for_recipient_filters_and_restarts() {
        let hub = CommunicationHub::new(RunId::new());
        hub.publish(phase_start("Foundation")).unwrap();
        hub.publish(agent_start("Nova")).unwrap();
        hub.publish(agent_start("Orion")).unwrap();

        let nova = hub.for_recipient(Recipient::Agent(AgentName::new("Nova")));
        let categories: Vec<MessageCategory> = nova.iter().map(|m| m.category()).collect();
        assert_eq!(
            categories,
            vec![MessageCategory::PhaseStart, MessageCategory::AgentStart]
        );

        // Iterating again yields the same sequence.
        let again: Vec<u64> = nova.iter().map(|m| m.sequence).collect();
        assert_eq!(again, vec![0, 1]);

        let ghost = hub.for_recipient(Recipient::Agent(AgentName::new("Ghost")));
        assert_eq!(ghost.count(), 1, "only the broadcast reaches an unknown agent");
    }

    /// Snapshots are unaffected by later publications.
    #[test]
    fn test_snapshot_is_stable() {
        let hub = CommunicationHub::new(RunId::new());
        hub.publish(phase_start("Foundation")).unwrap();
        let snapshot = hub.all_messages();
        hub.publish(agent_start("Nova")).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(hub.all_messages().len(), 2);
        assert_eq!((&snapshot).into_iter().count(), 1);
    }

    /// Mutating a stored message breaks the chain.
    #[test]
    fn test_tamper_detection() {
        let hub = CommunicationHub::new(RunId::new());
        hub.publish(phase_start("Foundation")).unwrap();
        hub.publish(agent_start("Nova")).unwrap();
        assert!(hub.verify_integrity());

        {
            let mut state = hub.state.lock().unwrap();
            state.messages[0].payload = MessagePayload::PhaseStart {
                phase: "Foundation".to_string(),
                goal: "TAMPERED".to_string(),
                agents: vec![],
            };
        }

        assert!(!hub.verify_integrity(), "chain must detect a modified payload");
    }

    /// Dropping a message from the middle is detected as a gap.
    #[test]
    fn test_removed_message_detected() {
        let run_id = RunId::new();
        let hub = CommunicationHub::new(run_id);
        hub.publish(phase_start("Foundation")).unwrap();
        hub.publish(agent_start("Nova")).unwrap();
        hub.publish(agent_start("Orion")).unwrap();

        let mut messages = hub.all_messages().to_vec();
        assert!(verify_chain(&run_id.to_string(), &messages));
        messages.remove(1);
        assert!(!verify_chain(&run_id.to_string(), &messages));
    }

    /// A full hub rejects further messages and keeps what it has.
    #[test]
    fn test_capacity_exhaustion() {
        let hub = CommunicationHub::with_capacity(RunId::new(), 2);
        hub.publish(phase_start("Foundation")).unwrap();
        hub.publish(agent_start("Nova")).unwrap();

        match hub.publish(agent_start("Orion")) {
            Err(NovaError::PublishFailed { reason }) => {
                assert!(reason.contains("capacity of 2"), "unexpected reason: {reason}");
            }
            other => panic!("expected PublishFailed, got {:?}", other),
        }
        assert_eq!(hub.len(), 2);
        assert!(hub.verify_integrity());
    }

    /// Concurrent publishers never race on sequence numbers.
    #[test]
    fn test_concurrent_publish_total_order() {
        let hub = Arc::new(CommunicationHub::new(RunId::new()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let hub = Arc::clone(&hub);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        hub.publish(agent_start(&format!("agent-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let log = hub.all_messages();
        assert_eq!(log.len(), 200);
        for (idx, message) in log.iter().enumerate() {
            assert_eq!(message.sequence, idx as u64);
        }
        assert!(hub.verify_integrity());
    }

    /// An empty chain is valid.
    #[test]
    fn test_verify_empty() {
        let hub = CommunicationHub::new(RunId::new());
        assert!(hub.is_empty());
        assert!(hub.latest().is_none());
        assert!(hub.verify_integrity());
        assert!(verify_chain("any-run", &[]));
    }
}
