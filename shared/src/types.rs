use std::collections::BTreeMap;

/// Session-scoped logical sequence of a [`Packet`](crate::Packet), starting at 1
pub type PacketSequence = u64;

/// Client-generated identifier correlating a request with the packets and
/// responses it produced
pub type RequestId = String;

/// Opaque cache-validation token for a channel's contents
pub type ETag = String;

/// Attribute name to scalar value, ordered so encodings are deterministic
pub type AttributeValues = BTreeMap<String, serde_json::Value>;
