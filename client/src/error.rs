use thiserror::Error;

use replicant_shared::{ChannelActionType, ChannelAddress, WireError};

/// Failure of a single request issued through a `Connector`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("Connector is not connected to a session")]
    Disconnected,

    #[error("Server rejected the request: {message}")]
    Rejected { message: String },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },
}

/// Attached to an `AreaOfInterest` whose subscribe, update or unsubscribe
/// failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action} of channel {address} failed: {reason}")]
pub struct ConvergenceActionFailed {
    pub address: ChannelAddress,
    pub action: ChannelActionType,
    pub reason: ConnectorError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicantClientError {
    #[error("Unable to decode server message: {0}")]
    Wire(#[from] WireError),

    #[error("Unexpected {message_type} message: {reason}")]
    UnexpectedMessage {
        message_type: String,
        reason: String,
    },
}
