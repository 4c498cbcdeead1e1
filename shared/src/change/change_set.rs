use std::collections::HashMap;

use crate::{Change, ChannelAction, ChannelActionType, ChannelAddress, EntityKey};

/// Channel actions and entity changes to deliver to one session in a single
/// packet. Changes keep their first-seen order; later changes to an entity
/// already in the set are merged into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    channel_actions: Vec<ChannelAction>,
    changes: Vec<Change>,
    change_index: HashMap<EntityKey, usize>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_actions(&self) -> &[ChannelAction] {
        &self.channel_actions
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn change(&self, key: &EntityKey) -> Option<&Change> {
        self.change_index.get(key).map(|index| &self.changes[*index])
    }

    pub fn is_empty(&self) -> bool {
        self.channel_actions.is_empty() && self.changes.is_empty()
    }

    pub fn add_channel_action(&mut self, action: ChannelAction) {
        self.channel_actions.push(action);
    }

    pub fn has_channel_action(&self, address: &ChannelAddress, action: ChannelActionType) -> bool {
        self.channel_actions
            .iter()
            .any(|existing| existing.action() == action && existing.address() == address)
    }

    pub fn merge_change(&mut self, change: Change) {
        match self.change_index.get(change.key()) {
            Some(index) => self.changes[*index].merge(change),
            None => {
                self.change_index.insert(*change.key(), self.changes.len());
                self.changes.push(change);
            }
        }
    }

    /// Appends another change set's actions and merges its changes
    pub fn merge(&mut self, other: ChangeSet) {
        self.channel_actions.extend(other.channel_actions);
        for change in other.changes {
            self.merge_change(change);
        }
    }

    /// Adds `address` to the channels of an entity change already in the set
    pub fn add_channel_to_change(&mut self, key: &EntityKey, address: ChannelAddress) -> bool {
        let Some(index) = self.change_index.get(key) else {
            return false;
        };
        self.changes[*index].add_channel(address);
        true
    }

    pub fn into_parts(self) -> (Vec<ChannelAction>, Vec<Change>) {
        (self.channel_actions, self.changes)
    }
}
