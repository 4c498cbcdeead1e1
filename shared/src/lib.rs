//! # Replicant Shared
//! Common functionality shared between replicant-server & replicant-client
//! crates: channel addresses and filters, change sets, sequenced packets with
//! their acknowledged queue, and the JSON wire protocol.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

mod backends;
mod change;
mod channel;
mod checked_set;
mod codec;
mod messages;
mod packet;
mod packet_queue;
mod types;

pub use backends::{Instant, TimeError, Timer, Timestamp};
pub use change::{
    change::{Change, EntityKey},
    change_set::ChangeSet,
};
pub use channel::{
    action::{ChannelAction, ChannelActionType},
    address::{Channel, ChannelAddress, RootId},
    error::ChannelDescriptorError,
    filter::{CanonicalJsonComparator, Filter, FilterComparator},
};
pub use checked_set::CheckedSet;
pub use codec::{
    decoder::{decode_change_set, decode_client_message, decode_packet, decode_server_message},
    encoder::{
        encode_change_set, encode_client_message, encode_packet, encode_server_message,
    },
    error::WireError,
};
pub use messages::{
    client_message::ClientMessage,
    server_message::ServerMessage,
    update_message::{EntityChangeRecord, FilteredChannelRecord, UpdateMessage},
};
pub use packet::Packet;
pub use packet_queue::PacketQueue;
pub use types::{AttributeValues, ETag, PacketSequence, RequestId};
