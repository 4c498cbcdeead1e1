use thiserror::Error;

use replicant_shared::{ChannelActionType, ChannelAddress, WireError};

/// Errors that can occur while the server processes session requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicantServerError {
    #[error("No session exists with key {key}")]
    BadSession { key: String },

    #[error("Channel {address} is already subscribed")]
    SubscriptionConflict { address: ChannelAddress },

    #[error("Channel {address} is not subscribed")]
    NotSubscribed { address: ChannelAddress },

    #[error("{action} of channel {address} rejected: {reason}")]
    ChannelActionRejected {
        address: ChannelAddress,
        action: ChannelActionType,
        reason: String,
    },

    #[error("Session {key} must authenticate before sending {request_type} requests")]
    NotAuthenticated { key: String, request_type: String },

    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] WireError),
}
