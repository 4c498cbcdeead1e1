use thiserror::Error;

/// Errors that can occur when parsing a channel descriptor such as `+1.7`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelDescriptorError {
    /// Descriptor was an empty string
    #[error("Channel descriptor is empty")]
    Empty,

    /// The channel id portion was not an unsigned integer
    #[error("Channel descriptor {descriptor:?} does not start with a numeric channel id")]
    InvalidChannelId { descriptor: String },

    /// A `.` separator was present but nothing followed it
    #[error("Channel descriptor {descriptor:?} has an empty root id after '.'")]
    EmptyRootId { descriptor: String },

    /// The leading action code was not one of `+`, `-`, `=`, `!`
    #[error("Channel descriptor {descriptor:?} has unknown action code {code:?} (expected one of '+', '-', '=', '!')")]
    UnknownActionCode { descriptor: String, code: char },
}
