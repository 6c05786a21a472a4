//! The in-memory communication hub.
//!
//! `CommunicationHub` keeps every message in a `Vec` behind a `Mutex`. The
//! mutex is the single serialization point for sequence numbers, so
//! concurrent publishers in parallel mode always produce one total order.
//!
//! One hub belongs to one run. The engine creates a fresh hub at run start.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use nova_contracts::{
    error::{NovaError, NovaResult},
    message::{Message, MessageDraft, Recipient},
    report::RunId,
};

use crate::{
    chain::{hash_message, verify_chain, GENESIS_HASH},
    view::{MessageLog, RecipientView},
};

/// Default upper bound on messages per run.
pub const DEFAULT_CAPACITY: usize = 10_000;

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct HubState {
    /// All messages published so far, in sequence order.
    pub(crate) messages: Vec<Message>,

    /// The `this_hash` of the last message, or `GENESIS_HASH`.
    pub(crate) last_hash: String,
}

// ── Public hub ────────────────────────────────────────────────────────────────

/// Append-only, hash-chained message log for a single run.
pub struct CommunicationHub {
    run_id: String,
    capacity: usize,
    pub(crate) state: Arc<Mutex<HubState>>,
}

impl CommunicationHub {
    /// Create an empty hub with [`DEFAULT_CAPACITY`].
    pub fn new(run_id: RunId) -> Self {
        Self::with_capacity(run_id, DEFAULT_CAPACITY)
    }

    /// Create an empty hub that accepts at most `capacity` messages.
    pub fn with_capacity(run_id: RunId, capacity: usize) -> Self {
        let state = HubState {
            messages: Vec::new(),
            last_hash: GENESIS_HASH.to_string(),
        };
        Self {
            run_id: run_id.to_string(),
            capacity,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a message, assigning the next sequence number.
    ///
    /// Fails with `PublishFailed` when the capacity is exhausted or the lock
    /// is poisoned. Never blocks beyond the mutex acquisition.
    pub fn publish(&self, draft: MessageDraft) -> NovaResult<Message> {
        let mut state = self.state.lock().map_err(|e| NovaError::PublishFailed {
            reason: format!("hub state lock poisoned: {}", e),
        })?;

        if state.messages.len() >= self.capacity {
            warn!(
                run_id = %self.run_id,
                capacity = self.capacity,
                category = %draft.payload.category(),
                "communication hub is full"
            );
            return Err(NovaError::PublishFailed {
                reason: format!("message log capacity of {} exhausted", self.capacity),
            });
        }

        let sequence = state.messages.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_message(&self.run_id, sequence, &draft, &prev_hash)?;

        let message = Message {
            sequence,
            sender: draft.sender,
            recipient: draft.recipient,
            payload: draft.payload,
            prev_hash,
            this_hash: this_hash.clone(),
        };

        debug!(
            run_id = %self.run_id,
            sequence,
            category = %message.category(),
            sender = %message.sender,
            recipient = %message.recipient,
            "message published"
        );

        state.messages.push(message.clone());
        state.last_hash = this_hash;

        Ok(message)
    }

    /// Snapshot of every message in publication order.
    pub fn all_messages(&self) -> MessageLog {
        MessageLog::new(self.lock_messages())
    }

    /// Messages addressed to `recipient` or broadcast, in publication order.
    pub fn for_recipient(&self, recipient: Recipient) -> RecipientView {
        self.all_messages().for_recipient(recipient)
    }

    /// The most recently published message.
    pub fn latest(&self) -> Option<Message> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.messages.last().cloned())
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.messages.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `this_hash` of the last message, or an empty string.
    pub fn terminal_hash(&self) -> String {
        self.latest().map(|m| m.this_hash).unwrap_or_default()
    }

    /// Verify the stored chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        match self.state.lock() {
            Ok(state) => verify_chain(&self.run_id, &state.messages),
            Err(_) => false,
        }
    }

    /// Consume the hub, returning the messages it holds.
    ///
    /// Still works after a poisoned lock so post-mortem data is never lost.
    pub fn into_messages(self) -> Vec<Message> {
        self.lock_messages()
    }

    fn lock_messages(&self) -> Vec<Message> {
        match self.state.lock() {
            Ok(state) => state.messages.clone(),
            Err(poisoned) => poisoned.into_inner().messages.clone(),
        }
    }
}
