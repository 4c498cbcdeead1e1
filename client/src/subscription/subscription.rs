use replicant_shared::{Channel, ChannelAddress, Filter};

/// A channel the server reports as subscribed for this client
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    channel: Channel,
    explicit_subscription: bool,
}

impl Subscription {
    pub fn new(channel: Channel, explicit_subscription: bool) -> Self {
        Self {
            channel,
            explicit_subscription,
        }
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

    /// Requested by this client, as opposed to held by the server because
    /// another subscribed channel depends on it
    pub fn is_explicit_subscription(&self) -> bool {
        self.explicit_subscription
    }

    pub(crate) fn set_explicit_subscription(&mut self, explicit_subscription: bool) {
        self.explicit_subscription = explicit_subscription;
    }

    pub(crate) fn set_filter(&mut self, filter: Option<Filter>) {
        self.channel.replace_filter(filter);
    }
}
