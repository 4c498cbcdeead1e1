use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// How often the converger compares desired and live subscriptions
    pub converge_interval: Duration,
    /// Whether subscribes of instance channels sharing a channel and filter
    /// are sent as one bulk request
    pub group_subscriptions: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            converge_interval: Duration::from_secs(2),
            group_subscriptions: true,
        }
    }
}
