use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ChannelAddress, ETag, Filter, RequestId};

/// Control messages sent from a client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "auth")]
    Auth {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        token: String,
    },

    /// Cache tokens the client holds for channel contents
    #[serde(rename = "etags")]
    ETags {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        etags: BTreeMap<ChannelAddress, ETag>,
    },

    #[serde(rename = "ping")]
    Ping {
        #[serde(rename = "requestId")]
        request_id: RequestId,
    },

    #[serde(rename = "sub")]
    Subscribe {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        channel: ChannelAddress,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<Filter>,
    },

    #[serde(rename = "unsub")]
    Unsubscribe {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        channel: ChannelAddress,
    },

    #[serde(rename = "bulk-sub")]
    BulkSubscribe {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        channels: Vec<ChannelAddress>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<Filter>,
    },

    #[serde(rename = "bulk-unsub")]
    BulkUnsubscribe {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        channels: Vec<ChannelAddress>,
    },

    /// Application command, executed by the server's command handler
    #[serde(rename = "exec")]
    Exec {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
}

impl ClientMessage {
    /// Every value the `type` field may take
    pub const TYPES: [&'static str; 8] = [
        "auth",
        "etags",
        "ping",
        "sub",
        "unsub",
        "bulk-sub",
        "bulk-unsub",
        "exec",
    ];

    pub fn request_id(&self) -> &str {
        match self {
            ClientMessage::Auth { request_id, .. }
            | ClientMessage::ETags { request_id, .. }
            | ClientMessage::Ping { request_id }
            | ClientMessage::Subscribe { request_id, .. }
            | ClientMessage::Unsubscribe { request_id, .. }
            | ClientMessage::BulkSubscribe { request_id, .. }
            | ClientMessage::BulkUnsubscribe { request_id, .. }
            | ClientMessage::Exec { request_id, .. } => request_id,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            ClientMessage::Auth { .. } => "auth",
            ClientMessage::ETags { .. } => "etags",
            ClientMessage::Ping { .. } => "ping",
            ClientMessage::Subscribe { .. } => "sub",
            ClientMessage::Unsubscribe { .. } => "unsub",
            ClientMessage::BulkSubscribe { .. } => "bulk-sub",
            ClientMessage::BulkUnsubscribe { .. } => "bulk-unsub",
            ClientMessage::Exec { .. } => "exec",
        }
    }
}
