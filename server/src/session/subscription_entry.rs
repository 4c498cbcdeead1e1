use replicant_shared::{ChannelAddress, CheckedSet, Filter};

/// One subscribed channel of a session.
///
/// `inward` holds the channels that keep this one alive, `outward` the
/// channels this one keeps alive. Edges are only changed through the
/// session's `SubscriptionGraph` so both directions stay in step.
#[derive(Debug, Clone)]
pub struct SubscriptionEntry {
    address: ChannelAddress,
    filter: Option<Filter>,
    explicitly_subscribed: bool,
    inward: CheckedSet<ChannelAddress>,
    outward: CheckedSet<ChannelAddress>,
}

impl SubscriptionEntry {
    pub(crate) fn new(
        address: ChannelAddress,
        filter: Option<Filter>,
        explicitly_subscribed: bool,
    ) -> Self {
        Self {
            address,
            filter,
            explicitly_subscribed,
            inward: CheckedSet::new(),
            outward: CheckedSet::new(),
        }
    }

    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn is_explicitly_subscribed(&self) -> bool {
        self.explicitly_subscribed
    }

    pub fn inward_subscriptions(&self) -> &CheckedSet<ChannelAddress> {
        &self.inward
    }

    pub fn outward_subscriptions(&self) -> &CheckedSet<ChannelAddress> {
        &self.outward
    }

    /// Neither requested by the client nor kept alive by another channel
    pub fn is_orphaned(&self) -> bool {
        !self.explicitly_subscribed && self.inward.is_empty()
    }

    pub(crate) fn set_filter(&mut self, filter: Option<Filter>) {
        self.filter = filter;
    }

    pub(crate) fn set_explicitly_subscribed(&mut self, explicitly_subscribed: bool) {
        self.explicitly_subscribed = explicitly_subscribed;
    }

    pub(crate) fn inward_mut(&mut self) -> &mut CheckedSet<ChannelAddress> {
        &mut self.inward
    }

    pub(crate) fn outward_mut(&mut self) -> &mut CheckedSet<ChannelAddress> {
        &mut self.outward
    }
}
