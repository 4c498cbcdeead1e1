use std::collections::BTreeSet;

use replicant_shared::{AttributeValues, Change, ChannelAddress, EntityKey, Filter};

/// States that a session subscribed to `source` must also be subscribed to
/// `target`
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLink {
    source: ChannelAddress,
    target: ChannelAddress,
    target_filter: Option<Filter>,
}

impl ChannelLink {
    pub fn new(source: ChannelAddress, target: ChannelAddress) -> Self {
        Self {
            source,
            target,
            target_filter: None,
        }
    }

    pub fn with_target_filter(mut self, filter: Filter) -> Self {
        self.target_filter = Some(filter);
        self
    }

    pub fn source(&self) -> &ChannelAddress {
        &self.source
    }

    pub fn target(&self) -> &ChannelAddress {
        &self.target
    }

    pub fn target_filter(&self) -> Option<&Filter> {
        self.target_filter.as_ref()
    }
}

/// A committed mutation of one entity, along with the channels it is routed
/// through and the links it establishes
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMessage {
    key: EntityKey,
    is_delete: bool,
    attribute_values: Option<AttributeValues>,
    routing_channels: BTreeSet<ChannelAddress>,
    links: Vec<ChannelLink>,
}

impl EntityMessage {
    pub fn update(key: EntityKey, attribute_values: AttributeValues) -> Self {
        Self {
            key,
            is_delete: false,
            attribute_values: Some(attribute_values),
            routing_channels: BTreeSet::new(),
            links: Vec::new(),
        }
    }

    pub fn delete(key: EntityKey) -> Self {
        Self {
            key,
            is_delete: true,
            attribute_values: None,
            routing_channels: BTreeSet::new(),
            links: Vec::new(),
        }
    }

    pub fn with_routing_channel(mut self, address: ChannelAddress) -> Self {
        self.routing_channels.insert(address);
        self
    }

    pub fn with_link(mut self, link: ChannelLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn is_delete(&self) -> bool {
        self.is_delete
    }

    pub fn attribute_values(&self) -> Option<&AttributeValues> {
        self.attribute_values.as_ref()
    }

    pub fn routing_channels(&self) -> &BTreeSet<ChannelAddress> {
        &self.routing_channels
    }

    pub fn links(&self) -> &[ChannelLink] {
        &self.links
    }

    /// The change a session receives through `channels`
    pub fn to_change<I: IntoIterator<Item = ChannelAddress>>(&self, channels: I) -> Change {
        let change = match &self.attribute_values {
            Some(attribute_values) if !self.is_delete => {
                Change::update(self.key, attribute_values.clone())
            }
            _ => Change::delete(self.key),
        };
        change.with_channels(channels)
    }
}
