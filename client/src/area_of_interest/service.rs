use std::collections::BTreeMap;

use log::debug;

use replicant_shared::{
    CanonicalJsonComparator, Channel, ChannelAddress, Filter, FilterComparator,
};

use crate::{AreaOfInterest, AreaOfInterestKey, AreaOfInterestStatus};

/// Registry of the areas of interest of one client context. Holds at most
/// one area per address.
pub struct AreaOfInterestService {
    areas: BTreeMap<ChannelAddress, AreaOfInterest>,
    next_key: u64,
    comparator: Box<dyn FilterComparator>,
}

impl AreaOfInterestService {
    pub fn new() -> Self {
        Self::with_comparator(CanonicalJsonComparator)
    }

    pub fn with_comparator<C: FilterComparator + 'static>(comparator: C) -> Self {
        Self {
            areas: BTreeMap::new(),
            next_key: 0,
            comparator: Box::new(comparator),
        }
    }

    pub fn comparator(&self) -> &dyn FilterComparator {
        self.comparator.as_ref()
    }

    /// Returns the area for `address`, creating it if needed, and counts one
    /// more observer. An existing area takes `filter` if it differs.
    pub fn find_or_create(
        &mut self,
        address: &ChannelAddress,
        filter: Option<Filter>,
    ) -> &mut AreaOfInterest {
        let next_key = &mut self.next_key;
        let comparator = &self.comparator;
        let area = self.areas.entry(address.clone()).or_insert_with(|| {
            *next_key += 1;
            let area = AreaOfInterest::new(
                AreaOfInterestKey::new(*next_key),
                Channel::new(address.clone(), filter.clone()),
            );
            debug!("created {}", area);
            area
        });
        if !comparator.filters_match(area.filter(), filter.as_ref()) {
            area.set_filter(filter);
        }
        area.retain();
        area
    }

    pub fn find(&self, address: &ChannelAddress) -> Option<&AreaOfInterest> {
        self.areas.get(address)
    }

    pub fn find_mut(&mut self, address: &ChannelAddress) -> Option<&mut AreaOfInterest> {
        self.areas.get_mut(address)
    }

    pub fn contains(&self, address: &ChannelAddress) -> bool {
        self.areas.contains_key(address)
    }

    /// Counts one observer less. The area is destroyed once nobody observes
    /// it and its request never reached the server or it is fully unloaded.
    /// Returns whether it was destroyed.
    pub fn release(&mut self, address: &ChannelAddress) -> bool {
        let Some(area) = self.areas.get_mut(address) else {
            return false;
        };
        area.release();
        if area.ref_count() > 0 {
            return false;
        }

        let disposable = matches!(
            area.status(),
            AreaOfInterestStatus::NotAsked
                | AreaOfInterestStatus::LoadFailed
                | AreaOfInterestStatus::Loading
                | AreaOfInterestStatus::Unloaded
        );
        if disposable {
            self.dispose(address);
        }
        disposable
    }

    pub fn dispose(&mut self, address: &ChannelAddress) -> Option<AreaOfInterest> {
        let area = self.areas.remove(address)?;
        debug!("disposed {}", area);
        Some(area)
    }

    /// Areas in address order
    pub fn iter(&self) -> impl Iterator<Item = &AreaOfInterest> {
        self.areas.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AreaOfInterest> {
        self.areas.values_mut()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &ChannelAddress> {
        self.areas.keys()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl Default for AreaOfInterestService {
    fn default() -> Self {
        Self::new()
    }
}
