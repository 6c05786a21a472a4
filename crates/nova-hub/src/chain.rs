//! Hash-chain primitives for the communication log.
//!
//! Hash input layout (bytes, in order):
//!   1. run_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of the message draft (sender, recipient, payload)

use sha2::{Digest, Sha256};

use nova_contracts::{
    error::{NovaError, NovaResult},
    message::{Message, MessageDraft},
};

/// The `prev_hash` of the first message in every log.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Compute the SHA-256 hash of one message.
///
/// Returns a lowercase 64-character hex string, or `PublishFailed` if the
/// draft cannot be serialized.
pub fn hash_message(
    run_id: &str,
    sequence: u64,
    draft: &MessageDraft,
    prev_hash: &str,
) -> NovaResult<String> {
    let body = serde_json::to_vec(draft).map_err(|e| NovaError::PublishFailed {
        reason: format!("message could not be serialized: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(run_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&body);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a message chain for `run_id`.
///
/// Valid when sequence numbers run 0, 1, 2, … without gaps, each
/// `prev_hash` equals the previous `this_hash` (or [`GENESIS_HASH`]), and each
/// `this_hash` matches the value recomputed from the message itself. An empty
/// chain is valid.
pub fn verify_chain(run_id: &str, messages: &[Message]) -> bool {
    let mut expected_prev = GENESIS_HASH.to_string();

    for (position, message) in messages.iter().enumerate() {
        if message.sequence != position as u64 || message.prev_hash != expected_prev {
            return false;
        }

        match hash_message(run_id, message.sequence, &message.draft(), &message.prev_hash) {
            Ok(recomputed) if recomputed == message.this_hash => {}
            _ => return false,
        }

        expected_prev = message.this_hash.clone();
    }

    true
}
