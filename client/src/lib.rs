//! # Replicant Client
//! Lets an application declare the channels it is interested in as areas of
//! interest and converges the live subscriptions of a server session towards
//! them. Change packets from the server are applied strictly in sequence.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replicant_shared::{
        Change, ChangeSet, Channel, ChannelAction, ChannelActionType, ChannelAddress, EntityKey,
        Filter, FilterComparator, RootId,
    };
}

mod area_of_interest;
mod client_config;
mod connection;
mod connector;
mod converger;
mod error;
mod subscription;

pub use area_of_interest::{
    area_of_interest::{
        AreaOfInterest, AreaOfInterestChange, AreaOfInterestKey, AreaOfInterestListener,
    },
    service::AreaOfInterestService,
    status::AreaOfInterestStatus,
};
pub use client_config::ClientConfig;
pub use connection::connection::Connection;
pub use connector::{Connector, ConnectorEvent};
pub use converger::ContextConverger;
pub use error::{ConnectorError, ConvergenceActionFailed, ReplicantClientError};
pub use subscription::{subscription::Subscription, subscription_service::SubscriptionService};
