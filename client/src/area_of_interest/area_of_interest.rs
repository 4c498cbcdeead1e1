use std::{fmt, mem};

use log::trace;

use replicant_shared::{Channel, ChannelAddress, Filter};

use crate::{AreaOfInterestStatus, ConvergenceActionFailed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaOfInterestKey(u64);

impl AreaOfInterestKey {
    pub(crate) fn new(key: u64) -> Self {
        Self(key)
    }
}

/// Which field of an `AreaOfInterest` changed
#[derive(Debug, Clone, PartialEq)]
pub enum AreaOfInterestChange {
    Status { previous: AreaOfInterestStatus },
    Error,
    Subscription,
    Filter,
}

/// Notified synchronously after each actual change of an `AreaOfInterest`
pub trait AreaOfInterestListener {
    fn on_change(&mut self, area: &AreaOfInterest, change: &AreaOfInterestChange);
}

impl<F: FnMut(&AreaOfInterest, &AreaOfInterestChange)> AreaOfInterestListener for F {
    fn on_change(&mut self, area: &AreaOfInterest, change: &AreaOfInterestChange) {
        self(area, change)
    }
}

/// A channel the application wants, with the progress of getting it.
///
/// Status, error, subscription and filter are independent fields: each
/// setter changes only its own field and notifies listeners once when the
/// value actually changed.
pub struct AreaOfInterest {
    key: AreaOfInterestKey,
    channel: Channel,
    status: AreaOfInterestStatus,
    error: Option<ConvergenceActionFailed>,
    subscription: Option<ChannelAddress>,
    ref_count: usize,
    listeners: Vec<Box<dyn AreaOfInterestListener>>,
}

impl AreaOfInterest {
    pub fn new(key: AreaOfInterestKey, channel: Channel) -> Self {
        Self {
            key,
            channel,
            status: AreaOfInterestStatus::NotAsked,
            error: None,
            subscription: None,
            ref_count: 0,
            listeners: Vec::new(),
        }
    }

    pub fn key(&self) -> AreaOfInterestKey {
        self.key
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn address(&self) -> &ChannelAddress {
        self.channel.address()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.channel.filter()
    }

    pub fn status(&self) -> AreaOfInterestStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ConvergenceActionFailed> {
        self.error.as_ref()
    }

    /// Address of the live subscription backing this area, once established
    pub fn subscription(&self) -> Option<&ChannelAddress> {
        self.subscription.as_ref()
    }

    /// Number of independent observers of this area
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    pub fn add_listener<L: AreaOfInterestListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_status(&mut self, status: AreaOfInterestStatus) -> bool {
        if self.status == status {
            return false;
        }
        if !self.status.is_valid_transition(status) {
            trace!("{} moving to {} outside its lifecycle", self, status);
        }

        let previous = mem::replace(&mut self.status, status);
        self.notify(AreaOfInterestChange::Status { previous });
        true
    }

    pub fn set_error(&mut self, error: Option<ConvergenceActionFailed>) -> bool {
        if self.error == error {
            return false;
        }
        self.error = error;
        self.notify(AreaOfInterestChange::Error);
        true
    }

    pub fn set_subscription(&mut self, subscription: Option<ChannelAddress>) -> bool {
        if self.subscription == subscription {
            return false;
        }
        self.subscription = subscription;
        self.notify(AreaOfInterestChange::Subscription);
        true
    }

    pub fn set_filter(&mut self, filter: Option<Filter>) -> bool {
        if !self.channel.replace_filter(filter) {
            return false;
        }
        self.notify(AreaOfInterestChange::Filter);
        true
    }

    pub(crate) fn retain(&mut self) {
        self.ref_count += 1;
    }

    pub(crate) fn release(&mut self) {
        self.ref_count = self.ref_count.saturating_sub(1);
    }

    fn notify(&mut self, change: AreaOfInterestChange) {
        let mut listeners = mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener.on_change(self, &change);
        }
        self.listeners = listeners;
    }
}

impl fmt::Display for AreaOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AreaOfInterest[{} Status: {}]",
            self.channel.address(),
            self.status
        )
    }
}

impl fmt::Debug for AreaOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AreaOfInterest")
            .field("key", &self.key)
            .field("channel", &self.channel)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("subscription", &self.subscription)
            .field("ref_count", &self.ref_count)
            .finish()
    }
}
