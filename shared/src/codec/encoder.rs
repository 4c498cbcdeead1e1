use serde_json::Value;

use crate::{
    ChangeSet, ClientMessage, EntityChangeRecord, FilteredChannelRecord, Packet, ServerMessage,
    UpdateMessage, WireError,
};

/// Encodes a change set into the body of an `update` message.
///
/// Channel actions without a filter become compact descriptors, actions with
/// a filter become `{cid, filter}` objects, and each change carries its
/// `typeId.entityId` id, its address-ordered channels and, unless it is a
/// delete, its attribute values.
pub fn encode_change_set(
    request_id: Option<&str>,
    response: Option<&Value>,
    etag: Option<&str>,
    change_set: &ChangeSet,
) -> UpdateMessage {
    let mut channels = Vec::new();
    let mut fchannels = Vec::new();
    for action in change_set.channel_actions() {
        match action.filter() {
            Some(filter) => fchannels.push(FilteredChannelRecord {
                cid: action.descriptor(),
                filter: filter.clone(),
            }),
            None => channels.push(action.descriptor()),
        }
    }

    let changes = change_set
        .changes()
        .iter()
        .map(|change| EntityChangeRecord {
            id: change.key().to_string(),
            channels: change
                .channels()
                .iter()
                .map(|address| address.to_string())
                .collect(),
            data: if change.is_delete() {
                None
            } else {
                Some(change.attribute_values().cloned().unwrap_or_default())
            },
        })
        .collect();

    UpdateMessage {
        sequence: None,
        request_id: request_id.map(str::to_string),
        response: response.cloned(),
        etag: etag.map(str::to_string),
        channels,
        fchannels,
        changes,
    }
}

pub fn encode_packet(packet: &Packet) -> ServerMessage {
    let mut update = encode_change_set(
        packet.request_id(),
        packet.response(),
        packet.etag(),
        packet.change_set(),
    );
    update.sequence = Some(packet.sequence());

    ServerMessage::Update(update)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, WireError> {
    serde_json::to_string(message).map_err(|error| WireError::EncodeFailed {
        reason: error.to_string(),
    })
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, WireError> {
    serde_json::to_string(message).map_err(|error| WireError::EncodeFailed {
        reason: error.to_string(),
    })
}
