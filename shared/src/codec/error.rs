use thiserror::Error;

use crate::ChannelDescriptorError;

/// Errors that can occur while encoding or decoding wire messages
///
/// Decoding processes untrusted input; every failure surfaces as one of these
/// variants and never as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The text was not a JSON object with a string `type`, or the body did
    /// not match the shape of its type
    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// The envelope was well formed but its `type` is not part of the protocol
    #[error("Unknown request type {request_type:?}")]
    UnknownRequestType { request_type: String },

    /// A channel descriptor inside the message could not be parsed
    #[error("Invalid channel descriptor: {0}")]
    InvalidChannelDescriptor(#[from] ChannelDescriptorError),

    /// An entity id was not of the form `typeId.entityId`
    #[error("Invalid entity id {id:?}, expected <typeId>.<entityId>")]
    InvalidEntityId { id: String },

    /// An update message that must be sequenced had no `seq`
    #[error("Update message carries no sequence number")]
    MissingSequence,

    /// Serialization failed
    #[error("Failed to encode message: {reason}")]
    EncodeFailed { reason: String },
}
