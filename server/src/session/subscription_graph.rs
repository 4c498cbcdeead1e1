use std::collections::{BTreeMap, VecDeque};

use log::debug;

use replicant_shared::{ChannelAddress, Filter};

use crate::{ReplicantServerError, SubscriptionEntry};

/// Every subscription of one session, keyed by address. Dependency edges are
/// stored as address sets on both endpoints.
///
/// Operations that remove edges or clear the explicit flag run the cascade
/// rule to a fixpoint before returning: an entry that is not explicitly
/// subscribed and has no inward subscriptions is removed, and its outward
/// edges are dropped in turn. They return the removed addresses in removal
/// order.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionGraph {
    entries: BTreeMap<ChannelAddress, SubscriptionEntry>,
}

impl SubscriptionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entry(
        &mut self,
        address: ChannelAddress,
        filter: Option<Filter>,
        explicitly_subscribed: bool,
    ) -> Result<&mut SubscriptionEntry, ReplicantServerError> {
        if self.entries.contains_key(&address) {
            return Err(ReplicantServerError::SubscriptionConflict { address });
        }

        let entry = SubscriptionEntry::new(address.clone(), filter, explicitly_subscribed);
        Ok(self.entries.entry(address).or_insert(entry))
    }

    pub fn get(&self, address: &ChannelAddress) -> Option<&SubscriptionEntry> {
        self.entries.get(address)
    }

    pub(crate) fn get_mut(&mut self, address: &ChannelAddress) -> Option<&mut SubscriptionEntry> {
        self.entries.get_mut(address)
    }

    pub fn contains(&self, address: &ChannelAddress) -> bool {
        self.entries.contains_key(address)
    }

    /// Entries in address order
    pub fn entries(&self) -> impl Iterator<Item = &SubscriptionEntry> {
        self.entries.values()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &ChannelAddress> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry at once, as on session teardown
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Records that each of `sources` keeps `address` alive
    pub fn register_inward_subscriptions(
        &mut self,
        address: &ChannelAddress,
        sources: &[ChannelAddress],
    ) {
        for source in sources {
            self.link(source, address);
        }
    }

    /// Records that `address` keeps each of `targets` alive
    pub fn register_outward_subscriptions(
        &mut self,
        address: &ChannelAddress,
        targets: &[ChannelAddress],
    ) {
        for target in targets {
            self.link(address, target);
        }
    }

    pub fn deregister_inward_subscriptions(
        &mut self,
        address: &ChannelAddress,
        sources: &[ChannelAddress],
    ) -> Vec<ChannelAddress> {
        for source in sources {
            self.unlink(source, address);
        }
        self.cascade(vec![address.clone()])
    }

    pub fn deregister_outward_subscriptions(
        &mut self,
        address: &ChannelAddress,
        targets: &[ChannelAddress],
    ) -> Vec<ChannelAddress> {
        for target in targets {
            self.unlink(address, target);
        }
        self.cascade(targets.to_vec())
    }

    pub fn set_explicitly_subscribed(
        &mut self,
        address: &ChannelAddress,
        explicitly_subscribed: bool,
    ) -> Result<Vec<ChannelAddress>, ReplicantServerError> {
        let Some(entry) = self.entries.get_mut(address) else {
            return Err(ReplicantServerError::NotSubscribed {
                address: address.clone(),
            });
        };
        entry.set_explicitly_subscribed(explicitly_subscribed);

        if explicitly_subscribed {
            return Ok(Vec::new());
        }
        Ok(self.cascade(vec![address.clone()]))
    }

    /// Removes an entry regardless of its flags or inward edges. Sources
    /// simply lose the edge; targets are cascaded. The removed entry is the
    /// first address returned.
    pub fn remove_entry(
        &mut self,
        address: &ChannelAddress,
    ) -> Result<Vec<ChannelAddress>, ReplicantServerError> {
        let Some(entry) = self.entries.remove(address) else {
            return Err(ReplicantServerError::NotSubscribed {
                address: address.clone(),
            });
        };
        debug!("removed subscription {}", address);

        for source in entry.inward_subscriptions().iter() {
            if let Some(source_entry) = self.entries.get_mut(source) {
                source_entry.outward_mut().remove(address);
            }
        }
        let targets: Vec<ChannelAddress> = entry.outward_subscriptions().iter().cloned().collect();
        for target in &targets {
            if let Some(target_entry) = self.entries.get_mut(target) {
                target_entry.inward_mut().remove(address);
            }
        }

        let mut removed = vec![address.clone()];
        removed.extend(self.cascade(targets));
        Ok(removed)
    }

    fn link(&mut self, source: &ChannelAddress, target: &ChannelAddress) {
        if source == target {
            return;
        }
        if !self.entries.contains_key(source) || !self.entries.contains_key(target) {
            panic!("Cannot link {} -> {}: both channels must be subscribed", source, target);
        }

        if let Some(source_entry) = self.entries.get_mut(source) {
            if source_entry.outward_subscriptions().contains(target) {
                return;
            }
            source_entry.outward_mut().insert(target.clone());
        }
        if let Some(target_entry) = self.entries.get_mut(target) {
            target_entry.inward_mut().insert(source.clone());
        }
    }

    fn unlink(&mut self, source: &ChannelAddress, target: &ChannelAddress) {
        match self.entries.get_mut(source) {
            Some(source_entry) => source_entry.outward_mut().remove(target),
            None => panic!("Cannot unlink from unknown channel {}", source),
        }
        match self.entries.get_mut(target) {
            Some(target_entry) => target_entry.inward_mut().remove(source),
            None => panic!("Cannot unlink unknown channel {}", target),
        }
    }

    fn cascade(&mut self, candidates: Vec<ChannelAddress>) -> Vec<ChannelAddress> {
        let mut pending: VecDeque<ChannelAddress> = candidates.into();
        let mut removed = Vec::new();

        while let Some(address) = pending.pop_front() {
            let orphaned = self
                .entries
                .get(&address)
                .is_some_and(SubscriptionEntry::is_orphaned);
            if !orphaned {
                continue;
            }
            let Some(entry) = self.entries.remove(&address) else {
                continue;
            };
            debug!("cascade removed subscription {}", address);

            for target in entry.outward_subscriptions().iter() {
                if let Some(target_entry) = self.entries.get_mut(target) {
                    target_entry.inward_mut().remove(&address);
                    pending.push_back(target.clone());
                }
            }
            removed.push(address);
        }

        removed
    }
}
