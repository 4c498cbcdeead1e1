use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AttributeValues, ETag, Filter, PacketSequence, RequestId};

/// Wire body of an `update` message. Field order is the encoding order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
    #[serde(rename = "seq", default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<PacketSequence>,
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<ETag>,
    /// Channel actions without a filter, as compact descriptors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    /// Channel actions carrying a filter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fchannels: Vec<FilteredChannelRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<EntityChangeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredChannelRecord {
    pub cid: String,
    pub filter: Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChangeRecord {
    /// `typeId.entityId`
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
    /// Absent for deletes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AttributeValues>,
}
