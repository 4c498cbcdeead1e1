use std::collections::BTreeMap;

use replicant_shared::{ChannelActionType, ChannelAddress, Filter};

use crate::ReplicantServerError;

/// How a channel uses filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Filters are rejected
    None,
    /// A filter is required and fixed for the life of the subscription
    Static,
    /// A filter is required and may be changed by an update
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    None,
    /// Content carries an eTag and clients holding it are told to use their
    /// cached copy
    Internal,
}

/// Static description of one channel of a replicated system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMetaData {
    channel_id: u32,
    name: String,
    instance_root_type_id: Option<u32>,
    filter_type: FilterType,
    cache_type: CacheType,
    external: bool,
}

impl ChannelMetaData {
    /// A channel covering every entity of a type. Addresses carry no root id.
    pub fn type_channel(channel_id: u32, name: &str) -> Self {
        Self {
            channel_id,
            name: name.to_string(),
            instance_root_type_id: None,
            filter_type: FilterType::None,
            cache_type: CacheType::None,
            external: true,
        }
    }

    /// A channel rooted at one entity of `root_type_id`. Addresses carry the
    /// root entity's id.
    pub fn instance_channel(channel_id: u32, name: &str, root_type_id: u32) -> Self {
        Self {
            instance_root_type_id: Some(root_type_id),
            ..Self::type_channel(channel_id, name)
        }
    }

    pub fn with_filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    pub fn with_cache_type(mut self, cache_type: CacheType) -> Self {
        self.cache_type = cache_type;
        self
    }

    /// Internal channels are only reachable through links, never by a client
    /// request
    pub fn with_external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_root_type_id(&self) -> Option<u32> {
        self.instance_root_type_id
    }

    pub fn is_instance_channel(&self) -> bool {
        self.instance_root_type_id.is_some()
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn has_filter(&self) -> bool {
        self.filter_type != FilterType::None
    }

    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache_type == CacheType::Internal
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Checks that `action` may be applied to `address` with `filter`
    pub fn validate(
        &self,
        action: ChannelActionType,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ReplicantServerError> {
        let reject = |reason: &str| ReplicantServerError::ChannelActionRejected {
            address: address.clone(),
            action,
            reason: reason.to_string(),
        };

        if address.channel_id() != self.channel_id {
            return Err(reject("address does not belong to this channel"));
        }
        match (self.is_instance_channel(), address.is_instance_channel()) {
            (true, false) => return Err(reject("instance channel requires a root id")),
            (false, true) => return Err(reject("type channel does not accept a root id")),
            _ => {}
        }
        if action == ChannelActionType::Remove {
            return Ok(());
        }
        match (self.filter_type, filter.is_some()) {
            (FilterType::None, true) => return Err(reject("channel does not accept a filter")),
            (FilterType::Static | FilterType::Dynamic, false) => {
                return Err(reject("channel requires a filter"))
            }
            _ => {}
        }
        if action == ChannelActionType::Update && self.filter_type != FilterType::Dynamic {
            return Err(reject("only dynamic filters can be updated"));
        }

        Ok(())
    }
}

/// Registry of every channel of one replicated system
#[derive(Debug, Clone, Default)]
pub struct SystemMetaData {
    name: String,
    channels: BTreeMap<u32, ChannelMetaData>,
}

impl SystemMetaData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            channels: BTreeMap::new(),
        }
    }

    /// Registers a channel, replacing any channel previously registered with
    /// the same id
    pub fn with_channel(mut self, channel: ChannelMetaData) -> Self {
        self.channels.insert(channel.channel_id(), channel);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self, channel_id: u32) -> Option<&ChannelMetaData> {
        self.channels.get(&channel_id)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelMetaData> {
        self.channels.values()
    }

    /// Instance channels whose root is an entity of `type_id`
    pub fn channels_rooted_at(&self, type_id: u32) -> impl Iterator<Item = &ChannelMetaData> {
        self.channels
            .values()
            .filter(move |channel| channel.instance_root_type_id() == Some(type_id))
    }
}
