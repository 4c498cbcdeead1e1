use std::fmt;

use serde::Serialize;

use replicant_shared::{ChannelAddress, Filter, PacketSequence};

use crate::{SessionKey, SubscriptionEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Open,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Open => f.write_str("OPEN"),
            SessionState::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Read-only snapshot of a session, suitable for a debug endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub key: SessionKey,
    pub state: SessionState,
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub last_error: Option<String>,
    pub queue_size: usize,
    pub last_sequence_acked: PacketSequence,
    pub subscriptions: Vec<SubscriptionStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub channel: ChannelAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub explicitly_subscribed: bool,
    pub inward_subscriptions: Vec<ChannelAddress>,
    pub outward_subscriptions: Vec<ChannelAddress>,
}

impl From<&SubscriptionEntry> for SubscriptionStatus {
    fn from(entry: &SubscriptionEntry) -> Self {
        Self {
            channel: entry.address().clone(),
            filter: entry.filter().cloned(),
            explicitly_subscribed: entry.is_explicitly_subscribed(),
            inward_subscriptions: entry.inward_subscriptions().iter().cloned().collect(),
            outward_subscriptions: entry.outward_subscriptions().iter().cloned().collect(),
        }
    }
}
