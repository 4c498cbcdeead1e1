use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Change, ChangeSet, ChannelAction, ChannelAddress, ClientMessage, EntityKey, Packet,
    ServerMessage, UpdateMessage, WireError,
};

/// Decodes a client control message, distinguishing unknown message types
/// from malformed envelopes
pub fn decode_client_message(text: &str) -> Result<ClientMessage, WireError> {
    decode_envelope(text, &ClientMessage::TYPES)
}

pub fn decode_server_message(text: &str) -> Result<ServerMessage, WireError> {
    decode_envelope(text, &ServerMessage::TYPES)
}

/// Decodes the body of an `update` message into a change set
pub fn decode_change_set(update: &UpdateMessage) -> Result<ChangeSet, WireError> {
    let mut change_set = ChangeSet::new();

    for descriptor in &update.channels {
        let (action, address) = ChannelAction::parse_descriptor(descriptor)?;
        change_set.add_channel_action(ChannelAction::new(address, action, None));
    }
    for record in &update.fchannels {
        let (action, address) = ChannelAction::parse_descriptor(&record.cid)?;
        change_set.add_channel_action(ChannelAction::new(
            address,
            action,
            Some(record.filter.clone()),
        ));
    }

    for record in &update.changes {
        let key = record.id.parse::<EntityKey>()?;
        let mut channels = Vec::with_capacity(record.channels.len());
        for channel in &record.channels {
            channels.push(channel.parse::<ChannelAddress>()?);
        }
        let change = match &record.data {
            Some(data) => Change::update(key, data.clone()),
            None => Change::delete(key),
        };
        change_set.merge_change(change.with_channels(channels));
    }

    Ok(change_set)
}

/// Decodes a sequenced `update` message into a packet
pub fn decode_packet(update: &UpdateMessage) -> Result<Packet, WireError> {
    let sequence = update.sequence.ok_or(WireError::MissingSequence)?;
    let change_set = decode_change_set(update)?;

    Ok(Packet::new(
        sequence,
        update.request_id.clone(),
        update.etag.clone(),
        update.response.clone(),
        change_set,
    ))
}

fn decode_envelope<T: DeserializeOwned>(text: &str, known_types: &[&str]) -> Result<T, WireError> {
    let value: Value = serde_json::from_str(text).map_err(|error| WireError::MalformedMessage {
        reason: error.to_string(),
    })?;

    let Some(message_type) = value.get("type") else {
        return Err(WireError::MalformedMessage {
            reason: "message has no type field".to_string(),
        });
    };
    let Some(message_type) = message_type.as_str() else {
        return Err(WireError::MalformedMessage {
            reason: "message type is not a string".to_string(),
        });
    };
    if !known_types.contains(&message_type) {
        debug!("received message of unknown type {:?}", message_type);
        return Err(WireError::UnknownRequestType {
            request_type: message_type.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|error| WireError::MalformedMessage {
        reason: error.to_string(),
    })
}
