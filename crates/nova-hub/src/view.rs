//! Read-only views over the communication log.
//!
//! Views are snapshots: they share the messages published up to the moment
//! they were taken and can be iterated any number of times.

use std::sync::Arc;

use nova_contracts::message::{Message, Recipient};

/// An ordered, immutable snapshot of the log.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<[Message]>,
}

impl MessageLog {
    pub(crate) fn new(messages: Vec<Message>) -> Self {
        Self { messages: messages.into() }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.to_vec()
    }

    /// Lazily filter this snapshot down to `recipient`'s inbox.
    pub fn for_recipient(&self, recipient: Recipient) -> RecipientView {
        RecipientView {
            log: self.clone(),
            recipient,
        }
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Messages addressed to one recipient or broadcast, in publication order.
///
/// Filtering happens during iteration.
#[derive(Debug, Clone)]
pub struct RecipientView {
    log: MessageLog,
    recipient: Recipient,
}

impl RecipientView {
    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ {
        self.log
            .iter()
            .filter(move |m| m.recipient.delivers_to(&self.recipient))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}
