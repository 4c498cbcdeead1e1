use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use replicant_shared::{Channel, ChannelAction, ChannelActionType, ChannelAddress, Filter};

use crate::Subscription;

/// The subscriptions the server has confirmed, kept in step with the channel
/// actions of processed packets
#[derive(Debug, Default)]
pub struct SubscriptionService {
    subscriptions: BTreeMap<ChannelAddress, Subscription>,
    deleted: BTreeSet<ChannelAddress>,
}

impl SubscriptionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_channel_action(&mut self, action: &ChannelAction) {
        let address = action.address();
        match action.action() {
            ChannelActionType::Add => match self.subscriptions.get_mut(address) {
                Some(subscription) => subscription.set_filter(action.filter().cloned()),
                None => {
                    let channel = Channel::new(address.clone(), action.filter().cloned());
                    self.subscriptions
                        .insert(address.clone(), Subscription::new(channel, false));
                }
            },
            ChannelActionType::Update => {
                if let Some(subscription) = self.subscriptions.get_mut(address) {
                    subscription.set_filter(action.filter().cloned());
                }
            }
            ChannelActionType::Remove => {
                self.subscriptions.remove(address);
            }
            ChannelActionType::Delete => {
                self.subscriptions.remove(address);
                self.deleted.insert(address.clone());
                debug!("channel {} deleted", address);
            }
        }
    }

    /// Records a completed explicit subscribe or update
    pub fn record_subscribed(&mut self, address: &ChannelAddress, filter: Option<Filter>) {
        match self.subscriptions.get_mut(address) {
            Some(subscription) => {
                subscription.set_explicit_subscription(true);
                subscription.set_filter(filter);
            }
            None => {
                let channel = Channel::new(address.clone(), filter);
                self.subscriptions
                    .insert(address.clone(), Subscription::new(channel, true));
            }
        }
    }

    /// Records a completed unsubscribe. The server may keep the channel as
    /// an implicit dependency of another subscription.
    pub fn record_unsubscribed(&mut self, address: &ChannelAddress) {
        if let Some(subscription) = self.subscriptions.get_mut(address) {
            subscription.set_explicit_subscription(false);
        }
    }

    /// Forgets every subscription. Deleted channels stay deleted.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn find(&self, address: &ChannelAddress) -> Option<&Subscription> {
        self.subscriptions.get(address)
    }

    pub fn is_deleted(&self, address: &ChannelAddress) -> bool {
        self.deleted.contains(address)
    }

    /// Subscriptions in address order
    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions.values()
    }

    pub fn explicit_subscriptions(&self) -> impl Iterator<Item = &Subscription> {
        self.subscriptions
            .values()
            .filter(|subscription| subscription.is_explicit_subscription())
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
