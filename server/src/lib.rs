//! # Replicant Server
//! Keeps, per client session, the graph of subscribed channels with their
//! cascading implicit dependencies, routes committed entity changes into the
//! sessions subscribed to them and queues the result as ordered packets the
//! client acknowledges.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replicant_shared::{
        Change, ChangeSet, Channel, ChannelAction, ChannelActionType, ChannelAddress, EntityKey,
        Filter, Packet, RootId, ServerMessage,
    };
}

mod channel;
mod error;
mod manager;
mod server_config;
mod session;

pub use channel::{
    loader::{ChannelContent, ChannelLoader},
    metadata::{CacheType, ChannelMetaData, FilterType, SystemMetaData},
};
pub use error::ReplicantServerError;
pub use manager::{
    change_transaction::ChangeTransaction,
    entity_message::{ChannelLink, EntityMessage},
    request_handler::{CommandHandler, CommandOutcome, TokenValidator},
    session_manager::{ReplicantSessionManager, SubscribeResponse},
};
pub use server_config::ServerConfig;
pub use session::{
    session::ReplicantSession,
    session_key::SessionKey,
    status::{SessionState, SessionStatus, SubscriptionStatus},
    subscription_entry::SubscriptionEntry,
    subscription_graph::SubscriptionGraph,
};
