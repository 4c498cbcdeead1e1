use serde::{Deserialize, Serialize};

use crate::{ChannelAddress, ETag, RequestId, UpdateMessage};

/// Messages sent from the server to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// A packet of channel actions and entity changes
    #[serde(rename = "update")]
    Update(UpdateMessage),

    /// The client's cached copy of the channel (by eTag) is current
    #[serde(rename = "use-cache")]
    UseCache {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        channel: ChannelAddress,
        etag: ETag,
    },

    #[serde(rename = "session-created")]
    SessionCreated {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    /// The request has completed; packets carrying its id precede this
    #[serde(rename = "ok")]
    Ok {
        #[serde(rename = "requestId")]
        request_id: RequestId,
    },

    #[serde(rename = "malformed-message")]
    MalformedMessage { message: String },

    #[serde(rename = "unknown-request-type")]
    UnknownRequestType { request: String },

    #[serde(rename = "error")]
    Error {
        #[serde(
            rename = "requestId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        request_id: Option<RequestId>,
        message: String,
    },
}

impl ServerMessage {
    pub const TYPES: [&'static str; 7] = [
        "update",
        "use-cache",
        "session-created",
        "ok",
        "malformed-message",
        "unknown-request-type",
        "error",
    ];

    pub fn request_id(&self) -> Option<&str> {
        match self {
            ServerMessage::Update(update) => update.request_id.as_deref(),
            ServerMessage::UseCache { request_id, .. } | ServerMessage::Ok { request_id } => {
                Some(request_id)
            }
            ServerMessage::Error { request_id, .. } => request_id.as_deref(),
            ServerMessage::SessionCreated { .. }
            | ServerMessage::MalformedMessage { .. }
            | ServerMessage::UnknownRequestType { .. } => None,
        }
    }
}
