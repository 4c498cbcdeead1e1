#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::json;

use replicant_server::{
    shared::{Change, Channel, ChannelAddress, EntityKey},
    CacheType, ChannelContent, ChannelLink, ChannelLoader, ChannelMetaData, EntityMessage,
    FilterType, ReplicantSessionManager, ServerConfig, SystemMetaData,
};

pub const FILTERED: u32 = 1;
pub const PERSON: u32 = 2;
pub const ADDRESS: u32 = 3;
pub const CATALOG: u32 = 4;
pub const HIDDEN: u32 = 5;

pub const PERSON_TYPE: u32 = 10;
pub const ADDRESS_TYPE: u32 = 20;

pub fn system() -> SystemMetaData {
    SystemMetaData::new("Test")
        .with_channel(
            ChannelMetaData::instance_channel(FILTERED, "Filtered", 1)
                .with_filter_type(FilterType::Dynamic),
        )
        .with_channel(ChannelMetaData::instance_channel(PERSON, "Person", PERSON_TYPE))
        .with_channel(ChannelMetaData::instance_channel(ADDRESS, "Address", ADDRESS_TYPE))
        .with_channel(
            ChannelMetaData::type_channel(CATALOG, "Catalog").with_cache_type(CacheType::Internal),
        )
        .with_channel(ChannelMetaData::type_channel(HIDDEN, "Hidden").with_external(false))
}

pub fn person(id: i64) -> ChannelAddress {
    ChannelAddress::instance_channel(PERSON, id)
}

pub fn address(id: i64) -> ChannelAddress {
    ChannelAddress::instance_channel(ADDRESS, id)
}

pub fn catalog() -> ChannelAddress {
    ChannelAddress::type_channel(CATALOG)
}

pub fn entity(type_id: u32, entity_id: i64, name: &str) -> Change {
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), json!(name));
    Change::update(EntityKey::new(type_id, entity_id), attributes)
}

pub fn person_update(id: i64, name: &str) -> EntityMessage {
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), json!(name));
    EntityMessage::update(EntityKey::new(PERSON_TYPE, id), attributes).with_routing_channel(person(id))
}

/// Content keyed by address. Unknown addresses load as empty channels.
#[derive(Default)]
pub struct StaticLoader {
    contents: BTreeMap<ChannelAddress, ChannelContent>,
    failing: Vec<ChannelAddress>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, address: ChannelAddress, content: ChannelContent) -> Self {
        self.contents.insert(address, content);
        self
    }

    pub fn with_failure(mut self, address: ChannelAddress) -> Self {
        self.failing.push(address);
        self
    }

    /// Each person links to the address channel with the same id
    pub fn people(ids: &[i64]) -> Self {
        let mut loader = Self::new();
        for id in ids {
            loader = loader.with_content(
                person(*id),
                ChannelContent::new()
                    .with_change(entity(PERSON_TYPE, *id, "person"))
                    .with_link(ChannelLink::new(person(*id), address(*id))),
            );
        }
        loader
    }
}

impl ChannelLoader for StaticLoader {
    fn load(&self, channel: &Channel) -> Result<ChannelContent, String> {
        if self.failing.contains(channel.address()) {
            return Err(format!("{} is unavailable", channel.address()));
        }
        Ok(self
            .contents
            .get(channel.address())
            .cloned()
            .unwrap_or_default())
    }
}

pub fn manager(loader: StaticLoader) -> ReplicantSessionManager {
    ReplicantSessionManager::new(ServerConfig::default(), system(), loader)
}
