use std::{collections::BTreeSet, fmt, str::FromStr};

use crate::{AttributeValues, ChannelAddress, WireError};

/// Identity of a replicated entity: its type within the system plus its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    type_id: u32,
    entity_id: i64,
}

impl EntityKey {
    pub fn new(type_id: u32, entity_id: i64) -> Self {
        Self { type_id, entity_id }
    }

    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }
}

/// Wire form is `typeId.entityId`
impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_id, self.entity_id)
    }
}

impl FromStr for EntityKey {
    type Err = WireError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let invalid = || WireError::InvalidEntityId { id: id.to_string() };
        let (type_part, entity_part) = id.split_once('.').ok_or_else(invalid)?;
        let type_id = type_part.parse::<u32>().map_err(|_| invalid())?;
        let entity_id = entity_part.parse::<i64>().map_err(|_| invalid())?;

        Ok(Self::new(type_id, entity_id))
    }
}

/// A single entity's change as seen by one session, along with the
/// channels through which the session receives it
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    key: EntityKey,
    is_delete: bool,
    attribute_values: Option<AttributeValues>,
    channels: BTreeSet<ChannelAddress>,
}

impl Change {
    pub fn update(key: EntityKey, attribute_values: AttributeValues) -> Self {
        Self {
            key,
            is_delete: false,
            attribute_values: Some(attribute_values),
            channels: BTreeSet::new(),
        }
    }

    /// Deletes never carry attribute values
    pub fn delete(key: EntityKey) -> Self {
        Self {
            key,
            is_delete: true,
            attribute_values: None,
            channels: BTreeSet::new(),
        }
    }

    pub fn with_channel(mut self, address: ChannelAddress) -> Self {
        self.channels.insert(address);
        self
    }

    pub fn with_channels<I: IntoIterator<Item = ChannelAddress>>(mut self, channels: I) -> Self {
        self.channels.extend(channels);
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

    pub fn channels(&self) -> &BTreeSet<ChannelAddress> {
        &self.channels
    }

    pub(crate) fn add_channel(&mut self, address: ChannelAddress) {
        self.channels.insert(address);
    }

    /// Folds a later change to the same entity into this one
    pub(crate) fn merge(&mut self, later: Change) {
        debug_assert_eq!(self.key, later.key);

        let Change {
            is_delete,
            attribute_values,
            channels,
            ..
        } = later;

        self.channels.extend(channels);

        if is_delete {
            self.is_delete = true;
            self.attribute_values = None;
            return;
        }

        let Some(incoming) = attribute_values else {
            return;
        };
        if let Some(existing) = self.attribute_values.as_mut() {
            existing.extend(incoming);
        } else {
            // update following a delete recreates the entity
            self.is_delete = false;
            self.attribute_values = Some(incoming);
        }
    }
}
