use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use serde_json::json;

use replicant_server::{
    shared::{Change, Channel, ChannelAddress, EntityKey},
    CacheType, ChannelContent, ChannelLink, ChannelLoader, ChannelMetaData, EntityMessage,
    FilterType, SystemMetaData,
};

pub const FILTERED: u32 = 1;
pub const PERSON: u32 = 2;
pub const ADDRESS: u32 = 3;
pub const CATALOG: u32 = 4;
pub const HIDDEN: u32 = 5;

pub const PERSON_TYPE: u32 = 10;
pub const ADDRESS_TYPE: u32 = 20;
pub const FILTERED_TYPE: u32 = 30;

pub fn system() -> SystemMetaData {
    SystemMetaData::new("Test")
        .with_channel(
            ChannelMetaData::instance_channel(FILTERED, "Filtered", FILTERED_TYPE)
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

pub fn hidden() -> ChannelAddress {
    ChannelAddress::type_channel(HIDDEN)
}

fn named(type_id: u32, entity_id: i64, name: &str) -> Change {
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), json!(name));
    Change::update(EntityKey::new(type_id, entity_id), attributes)
}

pub fn person_update(id: i64, name: &str) -> EntityMessage {
    let mut attributes = BTreeMap::new();
    attributes.insert("name".to_string(), json!(name));
    EntityMessage::update(EntityKey::new(PERSON_TYPE, id), attributes)
        .with_routing_channel(person(id))
}

/// Deleting a person deletes its instance channel
pub fn person_delete(id: i64) -> EntityMessage {
    EntityMessage::delete(EntityKey::new(PERSON_TYPE, id)).with_routing_channel(person(id))
}

/// Shared, editable channel contents. Every person links to the address
/// channel with the same id; unknown channels load empty.
#[derive(Clone, Default)]
pub struct TestChannelLoader {
    contents: Arc<RwLock<BTreeMap<ChannelAddress, ChannelContent>>>,
}

impl TestChannelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_content(&self, address: ChannelAddress, content: ChannelContent) {
        self.contents.write().insert(address, content);
    }

    pub fn add_person(&self, id: i64, name: &str) {
        self.set_content(
            person(id),
            ChannelContent::new()
                .with_change(named(PERSON_TYPE, id, name))
                .with_link(ChannelLink::new(person(id), address(id))),
        );
        self.set_content(
            address(id),
            ChannelContent::new().with_change(named(ADDRESS_TYPE, id, "street")),
        );
    }

    pub fn set_catalog(&self, etag: &str, items: &[&str]) {
        let mut content = ChannelContent::new().with_etag(etag);
        for (index, item) in items.iter().enumerate() {
            content = content.with_change(named(CATALOG, index as i64 + 1, item));
        }
        self.set_content(catalog(), content);
    }
}

impl ChannelLoader for TestChannelLoader {
    fn load(&self, channel: &Channel) -> Result<ChannelContent, String> {
        Ok(self
            .contents
            .read()
            .get(channel.address())
            .cloned()
            .unwrap_or_default())
    }
}
