use std::collections::BTreeSet;

use log::{debug, info, warn};

use replicant_shared::{
    ChannelAction, ChannelActionType, ChannelAddress, Filter, FilterComparator, Timer,
};

use crate::{
    AreaOfInterestKey, AreaOfInterestService, AreaOfInterestStatus, ClientConfig, Connector,
    ConnectorError, ConnectorEvent, ConvergenceActionFailed, SubscriptionService,
};

type ConvergeAction = Box<dyn FnMut()>;

enum Step {
    Subscribe(ChannelAddress, Option<Filter>),
    Update(ChannelAddress, Option<Filter>),
    Unsubscribe(ChannelAddress),
    Adopt(ChannelAddress),
    Dispose(ChannelAddress),
}

struct SubscribeGroup {
    key: Option<(u32, String)>,
    addresses: Vec<ChannelAddress>,
    filter: Option<Filter>,
}

/// Drives the live subscriptions of a `Connector` towards the areas of
/// interest an application declares.
///
/// Every pass compares the registry of areas with the confirmed
/// subscriptions and issues whatever requests close the gap. Requests are
/// asynchronous, so the areas move through their in-progress statuses and
/// settle when the connector reports the outcome. Passes run from `update`
/// whenever the converge timer rings, or on demand through `converge`.
pub struct ContextConverger<C: Connector> {
    connector: C,
    config: ClientConfig,
    areas: AreaOfInterestService,
    subscriptions: SubscriptionService,
    timer: Option<Timer>,
    paused: bool,
    pending_unsubscribes: BTreeSet<ChannelAddress>,
    pre_converge_action: Option<ConvergeAction>,
    converge_complete_action: Option<ConvergeAction>,
}

impl<C: Connector> ContextConverger<C> {
    pub fn new(connector: C, config: ClientConfig) -> Self {
        Self {
            connector,
            config,
            areas: AreaOfInterestService::new(),
            subscriptions: SubscriptionService::new(),
            timer: None,
            paused: false,
            pending_unsubscribes: BTreeSet::new(),
            pre_converge_action: None,
            converge_complete_action: None,
        }
    }

    /// Replaces the comparator deciding whether two filters are the same.
    /// Only meaningful before any area is declared.
    pub fn with_filter_comparator<F: FilterComparator + 'static>(mut self, comparator: F) -> Self {
        self.areas = AreaOfInterestService::with_comparator(comparator);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn areas(&self) -> &AreaOfInterestService {
        &self.areas
    }

    pub fn areas_mut(&mut self) -> &mut AreaOfInterestService {
        &mut self.areas
    }

    pub fn subscriptions(&self) -> &SubscriptionService {
        &self.subscriptions
    }

    /// Declares interest in a channel. The same address declared twice
    /// shares one area.
    pub fn add_area_of_interest(
        &mut self,
        address: &ChannelAddress,
        filter: Option<Filter>,
    ) -> AreaOfInterestKey {
        self.areas.find_or_create(address, filter).key()
    }

    /// Withdraws one declaration of interest
    pub fn release_area_of_interest(&mut self, address: &ChannelAddress) -> bool {
        self.areas.release(address)
    }

    // Lifecycle

    pub fn activate(&mut self) {
        if self.timer.is_none() {
            info!("converger activated");
            self.timer = Some(Timer::new(self.config.converge_interval));
        }
    }

    pub fn deactivate(&mut self) {
        if self.timer.take().is_some() {
            info!("converger deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Runs `action` with convergence suspended, so a batch of declarations
    /// is only acted upon once complete
    pub fn pause_and_run<F: FnOnce(&mut Self)>(&mut self, action: F) {
        let was_paused = self.paused;
        self.paused = true;
        action(self);
        self.paused = was_paused;
    }

    pub fn set_pre_converge_action<F: FnMut() + 'static>(&mut self, action: F) {
        self.pre_converge_action = Some(Box::new(action));
    }

    pub fn set_converge_complete_action<F: FnMut() + 'static>(&mut self, action: F) {
        self.converge_complete_action = Some(Box::new(action));
    }

    /// Applies whatever the connector reported, then converges if due
    pub fn update(&mut self) {
        self.process_events();

        let due = match &mut self.timer {
            Some(timer) if timer.ringing() => {
                timer.reset();
                true
            }
            _ => false,
        };
        if due {
            self.converge();
        }
    }

    // Convergence

    pub fn converge(&mut self) {
        if !self.is_active() || self.paused {
            return;
        }

        if let Some(action) = self.pre_converge_action.as_mut() {
            action();
        }

        let connected = self.connector.is_connected();
        let steps = self.plan(connected);

        let mut subscribes = Vec::new();
        for step in steps {
            match step {
                Step::Subscribe(address, filter) => subscribes.push((address, filter)),
                Step::Update(address, filter) => self.request_update(address, filter),
                Step::Unsubscribe(address) => self.request_unsubscribe(address),
                Step::Adopt(address) => self.adopt(&address),
                Step::Dispose(address) => {
                    self.areas.dispose(&address);
                }
            }
        }
        for group in self.group_subscribes(subscribes) {
            self.request_subscribe(group);
        }

        if connected {
            self.unsubscribe_orphans();
        }

        if let Some(action) = self.converge_complete_action.as_mut() {
            action();
        }
    }

    fn plan(&self, connected: bool) -> Vec<Step> {
        use AreaOfInterestStatus::*;

        let comparator = self.areas.comparator();
        let mut steps = Vec::new();

        for area in self.areas.iter() {
            let address = area.address().clone();
            let status = area.status();

            if area.ref_count() == 0 {
                match status {
                    Loaded | Updated | UpdateFailed if connected => {
                        steps.push(Step::Unsubscribe(address))
                    }
                    NotAsked | LoadFailed | Unloaded => steps.push(Step::Dispose(address)),
                    _ => {}
                }
                continue;
            }

            match status {
                NotAsked | LoadFailed | Unloaded => {
                    if !connected || self.subscriptions.is_deleted(&address) {
                        continue;
                    }
                    // Wait for an orphan unsubscribe to settle before asking again
                    if self.pending_unsubscribes.contains(&address) {
                        continue;
                    }
                    let explicit = self
                        .subscriptions
                        .find(&address)
                        .filter(|subscription| subscription.is_explicit_subscription());
                    if explicit.is_some() {
                        steps.push(Step::Adopt(address));
                    } else {
                        steps.push(Step::Subscribe(address, area.filter().cloned()));
                    }
                }
                Loaded | Updated if connected => {
                    let live_filter = self
                        .subscriptions
                        .find(&address)
                        .and_then(|subscription| subscription.filter());
                    if !comparator.filters_match(live_filter, area.filter()) {
                        steps.push(Step::Update(address, area.filter().cloned()));
                    }
                }
                _ => {}
            }
        }

        steps
    }

    fn group_subscribes(
        &self,
        subscribes: Vec<(ChannelAddress, Option<Filter>)>,
    ) -> Vec<SubscribeGroup> {
        let comparator = self.areas.comparator();
        let mut groups: Vec<SubscribeGroup> = Vec::new();

        for (address, filter) in subscribes {
            let key = (self.config.group_subscriptions && address.is_instance_channel()).then(|| {
                (
                    address.channel_id(),
                    comparator.filter_to_string(filter.as_ref()),
                )
            });
            let existing = key
                .as_ref()
                .and_then(|key| groups.iter_mut().find(|group| group.key.as_ref() == Some(key)));
            match existing {
                Some(group) => group.addresses.push(address),
                None => groups.push(SubscribeGroup {
                    key,
                    addresses: vec![address],
                    filter,
                }),
            }
        }

        groups
    }

    fn request_subscribe(&mut self, group: SubscribeGroup) {
        for address in &group.addresses {
            self.set_status(address, AreaOfInterestStatus::Loading);
        }

        let result = match group.addresses.as_slice() {
            [address] => self.connector.request_subscribe(address, group.filter.as_ref()),
            addresses => self
                .connector
                .request_bulk_subscribe(addresses, group.filter.as_ref()),
        };

        if let Err(error) = result {
            for address in group.addresses {
                self.on_failed(address, ChannelActionType::Add, error.clone());
            }
        }
    }

    fn request_update(&mut self, address: ChannelAddress, filter: Option<Filter>) {
        self.set_status(&address, AreaOfInterestStatus::Updating);
        if let Err(error) = self
            .connector
            .request_subscription_update(&address, filter.as_ref())
        {
            self.on_failed(address, ChannelActionType::Update, error);
        }
    }

    fn request_unsubscribe(&mut self, address: ChannelAddress) {
        self.set_status(&address, AreaOfInterestStatus::Unloading);
        if let Err(error) = self.connector.request_unsubscribe(&address) {
            self.on_failed(address, ChannelActionType::Remove, error);
        }
    }

    /// An explicit subscription already exists for a fresh area
    fn adopt(&mut self, address: &ChannelAddress) {
        debug!("reusing explicit subscription of {}", address);
        if let Some(area) = self.areas.find_mut(address) {
            area.set_subscription(Some(address.clone()));
            area.set_error(None);
            area.set_status(AreaOfInterestStatus::Loaded);
        }
    }

    fn unsubscribe_orphans(&mut self) {
        let orphans: Vec<ChannelAddress> = self
            .subscriptions
            .explicit_subscriptions()
            .map(|subscription| subscription.address())
            .filter(|address| {
                !self.areas.contains(address)
                    && !self.pending_unsubscribes.contains(*address)
                    && !self.subscriptions.is_deleted(address)
            })
            .cloned()
            .collect();
        if orphans.is_empty() {
            return;
        }

        debug!("unsubscribing {} unreferenced channels", orphans.len());
        let result = match orphans.as_slice() {
            [address] => self.connector.request_unsubscribe(address),
            addresses => self.connector.request_bulk_unsubscribe(addresses),
        };
        match result {
            Ok(()) => self.pending_unsubscribes.extend(orphans),
            Err(error) => warn!("Unable to unsubscribe unreferenced channels: {}", error),
        }
    }

    // Connector reports

    fn process_events(&mut self) {
        for event in self.connector.drain_events() {
            match event {
                ConnectorEvent::Completed {
                    address,
                    action,
                    filter,
                } => self.on_completed(address, action, filter),
                ConnectorEvent::Failed {
                    address,
                    action,
                    error,
                } => self.on_failed(address, action, error),
                ConnectorEvent::ChannelActions(actions) => {
                    for action in actions {
                        self.on_channel_action(action);
                    }
                }
                ConnectorEvent::SessionReset => self.on_session_reset(),
            }
        }
    }

    fn on_completed(
        &mut self,
        address: ChannelAddress,
        action: ChannelActionType,
        filter: Option<Filter>,
    ) {
        match action {
            ChannelActionType::Add => {
                self.subscriptions.record_subscribed(&address, filter);
                match self.areas.find_mut(&address) {
                    Some(area) if area.status() == AreaOfInterestStatus::Loading => {
                        area.set_subscription(Some(address.clone()));
                        area.set_error(None);
                        area.set_status(AreaOfInterestStatus::Loaded);
                    }
                    _ => debug!("subscribe of {} completed after it was withdrawn", address),
                }
            }
            ChannelActionType::Update => {
                self.subscriptions.record_subscribed(&address, filter);
                match self.areas.find_mut(&address) {
                    Some(area) if area.status() == AreaOfInterestStatus::Updating => {
                        area.set_error(None);
                        area.set_status(AreaOfInterestStatus::Updated);
                    }
                    _ => debug!("update of {} completed after it was withdrawn", address),
                }
            }
            ChannelActionType::Remove => {
                self.pending_unsubscribes.remove(&address);
                self.subscriptions.record_unsubscribed(&address);
                let Some(area) = self.areas.find_mut(&address) else {
                    return;
                };
                match area.status() {
                    AreaOfInterestStatus::Unloading => {}
                    AreaOfInterestStatus::Loaded
                    | AreaOfInterestStatus::Updated
                    | AreaOfInterestStatus::UpdateFailed => {
                        debug!("{} lost its subscription, asking again", area);
                        area.set_subscription(None);
                        area.set_error(None);
                        area.set_status(AreaOfInterestStatus::NotAsked);
                        return;
                    }
                    _ => {
                        debug!("unsubscribe of {} completed for {}", address, area);
                        return;
                    }
                }
                area.set_subscription(None);
                area.set_error(None);
                area.set_status(AreaOfInterestStatus::Unloaded);
                if area.ref_count() == 0 {
                    self.areas.dispose(&address);
                }
            }
            ChannelActionType::Delete => {}
        }
    }

    fn on_failed(
        &mut self,
        address: ChannelAddress,
        action: ChannelActionType,
        error: ConnectorError,
    ) {
        if action == ChannelActionType::Remove {
            self.pending_unsubscribes.remove(&address);
        }
        warn!("{} of {} failed: {}", action, address, error);

        let (expected, failed) = match action {
            ChannelActionType::Add => (
                AreaOfInterestStatus::Loading,
                AreaOfInterestStatus::LoadFailed,
            ),
            ChannelActionType::Update => (
                AreaOfInterestStatus::Updating,
                AreaOfInterestStatus::UpdateFailed,
            ),
            ChannelActionType::Remove => (
                AreaOfInterestStatus::Unloading,
                AreaOfInterestStatus::Loaded,
            ),
            ChannelActionType::Delete => return,
        };
        let Some(area) = self.areas.find_mut(&address) else {
            return;
        };
        if area.status() != expected {
            return;
        }
        area.set_error(Some(ConvergenceActionFailed {
            address: address.clone(),
            action,
            reason: error,
        }));
        area.set_status(failed);
    }

    fn on_channel_action(&mut self, action: ChannelAction) {
        self.subscriptions.apply_channel_action(&action);
        if action.action() != ChannelActionType::Delete {
            return;
        }

        let address = action.address();
        self.pending_unsubscribes.remove(address);
        let Some(area) = self.areas.find_mut(address) else {
            return;
        };
        info!("{} was deleted", area);
        area.set_subscription(None);
        area.set_status(AreaOfInterestStatus::Unloaded);
        if area.ref_count() == 0 {
            self.areas.dispose(address);
        }
    }

    /// A new session holds no subscriptions, so every declared area starts
    /// over and the next pass subscribes it again
    fn on_session_reset(&mut self) {
        info!("session reset, resubscribing {} areas", self.areas.len());
        self.subscriptions.clear();
        self.pending_unsubscribes.clear();

        let released: Vec<ChannelAddress> = self
            .areas
            .iter()
            .filter(|area| area.ref_count() == 0)
            .map(|area| area.address().clone())
            .collect();
        for address in released {
            self.areas.dispose(&address);
        }
        for area in self.areas.iter_mut() {
            if area.status() == AreaOfInterestStatus::Unloaded
                && self.subscriptions.is_deleted(area.address())
            {
                continue;
            }
            area.set_subscription(None);
            area.set_error(None);
            area.set_status(AreaOfInterestStatus::NotAsked);
        }
    }

    fn set_status(&mut self, address: &ChannelAddress, status: AreaOfInterestStatus) {
        if let Some(area) = self.areas.find_mut(address) {
            area.set_status(status);
        }
    }
}
