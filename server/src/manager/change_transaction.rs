use log::debug;
use serde_json::Value;

use crate::{EntityMessage, ReplicantServerError, ReplicantSessionManager, SessionKey};

/// Collects entity messages produced by one unit of work. Nothing reaches a
/// session queue until `commit`; dropping the transaction discards it.
pub struct ChangeTransaction<'m> {
    manager: &'m ReplicantSessionManager,
    messages: Vec<EntityMessage>,
}

impl<'m> ChangeTransaction<'m> {
    pub(crate) fn new(manager: &'m ReplicantSessionManager) -> Self {
        Self {
            manager,
            messages: Vec::new(),
        }
    }

    pub fn record(&mut self, message: EntityMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[EntityMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Routes the recorded messages into every session. `origin` names the
    /// session and request that caused them; that session always receives a
    /// packet carrying the request id and `response`, even when empty.
    pub fn commit(
        mut self,
        origin: Option<(&SessionKey, &str)>,
        response: Option<Value>,
    ) -> Result<(), ReplicantServerError> {
        let messages = std::mem::take(&mut self.messages);
        self.manager.route_messages(&messages, origin, response)
    }
}

impl Drop for ChangeTransaction<'_> {
    fn drop(&mut self) {
        if !self.messages.is_empty() {
            debug!(
                "discarding {} uncommitted entity messages",
                self.messages.len()
            );
        }
    }
}
