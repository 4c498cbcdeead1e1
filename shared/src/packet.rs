use serde_json::Value;

use crate::{ChangeSet, ETag, PacketSequence, RequestId};

/// One sequence-numbered bundle of changes delivered to a session.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    sequence: PacketSequence,
    request_id: Option<RequestId>,
    etag: Option<ETag>,
    response: Option<Value>,
    change_set: ChangeSet,
}

impl Packet {
    pub fn new(
        sequence: PacketSequence,
        request_id: Option<RequestId>,
        etag: Option<ETag>,
        response: Option<Value>,
        change_set: ChangeSet,
    ) -> Self {
        Self {
            sequence,
            request_id,
            etag,
            response,
            change_set,
        }
    }

    pub fn sequence(&self) -> PacketSequence {
        self.sequence
    }

    /// The client request this packet answers, if any. Packets without one
    /// are pushes caused by other sessions' actions.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    pub fn change_set(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn is_less_than(&self, other: &Packet) -> bool {
        self.sequence < other.sequence
    }
}
