use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use log::{debug, info, trace, warn};
use parking_lot::RwLock;
use serde_json::Value;

use replicant_shared::{
    encode_packet, CanonicalJsonComparator, ChangeSet, Channel, ChannelAction, ChannelActionType,
    ChannelAddress, ETag, Filter, FilterComparator, Packet, PacketSequence, ServerMessage,
};

use crate::{
    session::session::SessionData, ChangeTransaction, ChannelContent, ChannelLink,
    ChannelLoader, ChannelMetaData, CommandHandler, EntityMessage, ReplicantServerError,
    ReplicantSession, ServerConfig, SessionKey, SessionState, SystemMetaData, TokenValidator,
};

/// How a subscribe request was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeResponse {
    /// Channel content was queued, tagged with `etag` for cached channels
    Delivered { etag: Option<ETag> },
    /// The client's cached copy is current and nothing was queued
    UseCache { etag: ETag },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubscribeOrigin {
    Request,
    BulkRequest,
    Link,
}

impl SubscribeOrigin {
    fn is_explicit(self) -> bool {
        self != SubscribeOrigin::Link
    }
}

/// Owns every live session and turns subscriptions and committed entity
/// messages into packets on the sessions' queues.
///
/// Each session's state sits behind its own lock; the registry itself is
/// read-mostly. Operations on one session never touch another session's
/// state, except transaction commits which visit sessions one at a time.
pub struct ReplicantSessionManager {
    config: ServerConfig,
    system: SystemMetaData,
    loader: Box<dyn ChannelLoader>,
    comparator: Box<dyn FilterComparator + Send + Sync>,
    command_handler: Option<Box<dyn CommandHandler>>,
    token_validator: Option<Box<dyn TokenValidator>>,
    sessions: RwLock<HashMap<SessionKey, Arc<ReplicantSession>>>,
    deleted_instances: RwLock<HashSet<ChannelAddress>>,
}

impl ReplicantSessionManager {
    pub fn new<L: ChannelLoader + 'static>(
        config: ServerConfig,
        system: SystemMetaData,
        loader: L,
    ) -> Self {
        Self {
            config,
            system,
            loader: Box::new(loader),
            comparator: Box::new(CanonicalJsonComparator),
            command_handler: None,
            token_validator: None,
            sessions: RwLock::new(HashMap::new()),
            deleted_instances: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_command_handler<H: CommandHandler + 'static>(mut self, handler: H) -> Self {
        self.command_handler = Some(Box::new(handler));
        self
    }

    /// Without a validator any non-empty token is accepted
    pub fn with_token_validator<V: TokenValidator + 'static>(mut self, validator: V) -> Self {
        self.token_validator = Some(Box::new(validator));
        self
    }

    pub fn with_filter_comparator<C: FilterComparator + Send + Sync + 'static>(
        mut self,
        comparator: C,
    ) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn system_metadata(&self) -> &SystemMetaData {
        &self.system
    }

    // Sessions

    pub fn create_session(&self) -> Arc<ReplicantSession> {
        let session = Arc::new(ReplicantSession::new(SessionKey::generate()));
        self.sessions
            .write()
            .insert(session.key().clone(), session.clone());
        info!("Session {} created", session.key());

        session
    }

    /// Removes a session and disposes its queue and subscriptions
    pub fn invalidate_session(&self, key: &SessionKey) -> Result<(), ReplicantServerError> {
        let Some(session) = self.sessions.write().remove(key) else {
            return Err(bad_session(key));
        };
        session.close();
        info!("Session {} invalidated", key);

        Ok(())
    }

    pub fn session(&self, key: &SessionKey) -> Result<Arc<ReplicantSession>, ReplicantServerError> {
        self.sessions
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| bad_session(key))
    }

    pub fn has_session(&self, key: &SessionKey) -> bool {
        self.sessions.read().contains_key(key)
    }

    pub fn session_keys(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self.sessions.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Closes every session idle longer than the configured timeout
    pub fn remove_idle_sessions(&self) -> Vec<SessionKey> {
        let timeout = self.config.session_timeout;
        let idle: Vec<SessionKey> = self
            .sessions
            .read()
            .values()
            .filter(|session| session.idle_for() > timeout)
            .map(|session| session.key().clone())
            .collect();

        for key in &idle {
            if self.invalidate_session(key).is_ok() {
                info!("Session {} closed after idling", key);
            }
        }

        idle
    }

    // Packets

    /// Queues a packet for a session. `request_id` names the request the
    /// packet answers, if any.
    pub fn send_packet(
        &self,
        key: &SessionKey,
        request_id: Option<&str>,
        etag: Option<&str>,
        change_set: ChangeSet,
    ) -> Result<Packet, ReplicantServerError> {
        let session = self.session(key)?;
        let mut data = session.lock();

        Ok(data.queue.add_packet(
            request_id.map(str::to_string),
            etag.map(str::to_string),
            None,
            change_set,
        ))
    }

    /// Acknowledges every packet up to `last_sequence_acked` and returns the
    /// next one, unless it has not been queued yet
    pub fn poll_packet(
        &self,
        key: &SessionKey,
        last_sequence_acked: PacketSequence,
    ) -> Result<Option<Packet>, ReplicantServerError> {
        let session = self.session(key)?;
        session.touch();

        let mut data = session.lock();
        data.queue.ack(last_sequence_acked);
        Ok(data.queue.next_packet_to_process().cloned())
    }

    /// `poll_packet`, encoded as an `update` message
    pub fn poll_message(
        &self,
        key: &SessionKey,
        last_sequence_acked: PacketSequence,
    ) -> Result<Option<ServerMessage>, ReplicantServerError> {
        Ok(self
            .poll_packet(key, last_sequence_acked)?
            .map(|packet| encode_packet(&packet)))
    }

    // Subscriptions

    pub fn subscribe(
        &self,
        key: &SessionKey,
        request_id: &str,
        address: &ChannelAddress,
        filter: Option<Filter>,
    ) -> Result<SubscribeResponse, ReplicantServerError> {
        let session = self.session(key)?;
        let mut data = session.lock();

        let mut change_set = ChangeSet::new();
        let response = self.subscribe_locked(
            &mut data,
            &mut change_set,
            address,
            filter,
            SubscribeOrigin::Request,
        )?;
        if let SubscribeResponse::Delivered { etag } = &response {
            data.queue
                .add_packet(Some(request_id.to_string()), etag.clone(), None, change_set);
        }

        Ok(response)
    }

    /// Subscribes to several instances of one channel in a single packet.
    /// Addresses already explicitly subscribed are skipped. If any address
    /// fails the whole request is rolled back and nothing is queued.
    pub fn bulk_subscribe(
        &self,
        key: &SessionKey,
        request_id: &str,
        addresses: &[ChannelAddress],
        filter: Option<Filter>,
    ) -> Result<(), ReplicantServerError> {
        if let Some(first) = addresses.first() {
            if let Some(other) = addresses
                .iter()
                .find(|address| address.channel_id() != first.channel_id())
            {
                return Err(rejected(
                    other,
                    ChannelActionType::Add,
                    "bulk subscriptions must share one channel",
                ));
            }
        }
        for address in addresses {
            self.channel_metadata(ChannelActionType::Add, address, filter.as_ref(), true)?;
        }

        let session = self.session(key)?;
        let mut data = session.lock();

        let graph = data.graph.clone();
        let etags = data.etags.clone();
        let mut change_set = ChangeSet::new();
        for address in addresses {
            let explicit = data
                .graph
                .get(address)
                .is_some_and(|entry| entry.is_explicitly_subscribed());
            if explicit {
                debug!("bulk subscribe skipping {}, already subscribed", address);
                continue;
            }
            if let Err(error) = self.subscribe_locked(
                &mut data,
                &mut change_set,
                address,
                filter.clone(),
                SubscribeOrigin::BulkRequest,
            ) {
                debug!("bulk subscribe failed at {}, rolling back", address);
                data.graph = graph;
                data.etags = etags;
                return Err(error);
            }
        }
        data.queue
            .add_packet(Some(request_id.to_string()), None, None, change_set);

        Ok(())
    }

    /// Changes the filter of a dynamic-filter subscription and relinks the
    /// channel's dependencies
    pub fn update_subscription(
        &self,
        key: &SessionKey,
        request_id: &str,
        address: &ChannelAddress,
        filter: Option<Filter>,
    ) -> Result<(), ReplicantServerError> {
        let session = self.session(key)?;
        let mut data = session.lock();

        let mut change_set = ChangeSet::new();
        self.update_locked(&mut data, &mut change_set, address, filter)?;
        data.queue
            .add_packet(Some(request_id.to_string()), None, None, change_set);

        Ok(())
    }

    pub fn unsubscribe(
        &self,
        key: &SessionKey,
        request_id: &str,
        address: &ChannelAddress,
    ) -> Result<(), ReplicantServerError> {
        let session = self.session(key)?;
        let mut data = session.lock();

        let mut change_set = ChangeSet::new();
        unsubscribe_locked(&mut data, &mut change_set, address)?;
        data.queue
            .add_packet(Some(request_id.to_string()), None, None, change_set);

        Ok(())
    }

    /// Addresses that are not explicitly subscribed are skipped
    pub fn bulk_unsubscribe(
        &self,
        key: &SessionKey,
        request_id: &str,
        addresses: &[ChannelAddress],
    ) -> Result<(), ReplicantServerError> {
        let session = self.session(key)?;
        let mut data = session.lock();

        let mut change_set = ChangeSet::new();
        for address in addresses {
            let explicit = data
                .graph
                .get(address)
                .is_some_and(|entry| entry.is_explicitly_subscribed());
            if !explicit {
                debug!("bulk unsubscribe skipping {}, not subscribed", address);
                continue;
            }
            unsubscribe_locked(&mut data, &mut change_set, address)?;
        }
        data.queue
            .add_packet(Some(request_id.to_string()), None, None, change_set);

        Ok(())
    }

    /// Records the cache tokens a client holds
    pub fn record_etags(
        &self,
        key: &SessionKey,
        etags: BTreeMap<ChannelAddress, ETag>,
    ) -> Result<(), ReplicantServerError> {
        let session = self.session(key)?;
        session.lock().etags.extend(etags);

        Ok(())
    }

    /// Instance channels whose root entity was deleted can never be
    /// subscribed again
    pub fn is_instance_deleted(&self, address: &ChannelAddress) -> bool {
        self.deleted_instances.read().contains(address)
    }

    // Transactions

    pub fn begin_transaction(&self) -> ChangeTransaction<'_> {
        ChangeTransaction::new(self)
    }

    pub(crate) fn route_messages(
        &self,
        messages: &[EntityMessage],
        origin: Option<(&SessionKey, &str)>,
        response: Option<Value>,
    ) -> Result<(), ReplicantServerError> {
        if let Some((key, _)) = origin {
            if !self.has_session(key) {
                return Err(bad_session(key));
            }
        }

        let deleted = self.deleted_instance_channels(messages);
        let sessions: Vec<Arc<ReplicantSession>> =
            self.sessions.read().values().cloned().collect();

        for session in sessions {
            let mut data = session.lock();
            if data.state == SessionState::Closed {
                continue;
            }

            let mut change_set = ChangeSet::new();
            for message in messages {
                self.route_message(&mut data, &mut change_set, message);
            }
            for address in &deleted {
                let Ok(removed) = data.graph.remove_entry(address) else {
                    continue;
                };
                change_set.add_channel_action(ChannelAction::delete(address.clone()));
                for removed_address in removed.into_iter().skip(1) {
                    change_set.add_channel_action(ChannelAction::remove(removed_address));
                }
            }

            let request_id = origin
                .filter(|(key, _)| *key == session.key())
                .map(|(_, request_id)| request_id.to_string());
            if request_id.is_some() {
                data.queue
                    .add_packet(request_id, None, response.clone(), change_set);
            } else if !change_set.is_empty() {
                data.queue.add_packet(None, None, None, change_set);
            }
        }

        Ok(())
    }

    // Internals

    pub(crate) fn command_handler(&self) -> Option<&dyn CommandHandler> {
        self.command_handler.as_deref()
    }

    pub(crate) fn validate_token(&self, key: &SessionKey, token: &str) -> bool {
        match &self.token_validator {
            Some(validator) => validator.validate(key, token),
            None => !token.is_empty(),
        }
    }

    pub(crate) fn filters_match(&self, a: Option<&Filter>, b: Option<&Filter>) -> bool {
        self.comparator.filters_match(a, b)
    }

    fn channel_metadata(
        &self,
        action: ChannelActionType,
        address: &ChannelAddress,
        filter: Option<&Filter>,
        explicit: bool,
    ) -> Result<&ChannelMetaData, ReplicantServerError> {
        let Some(channel) = self.system.channel(address.channel_id()) else {
            return Err(rejected(address, action, "unknown channel"));
        };
        if explicit && !channel.is_external() {
            return Err(rejected(
                address,
                action,
                "channel is not available to clients",
            ));
        }
        channel.validate(action, address, filter)?;
        if action != ChannelActionType::Remove && self.is_instance_deleted(address) {
            return Err(rejected(address, action, "channel has been deleted"));
        }

        Ok(channel)
    }

    fn subscribe_locked(
        &self,
        data: &mut SessionData,
        change_set: &mut ChangeSet,
        address: &ChannelAddress,
        filter: Option<Filter>,
        origin: SubscribeOrigin,
    ) -> Result<SubscribeResponse, ReplicantServerError> {
        let explicit = origin.is_explicit();
        let channel =
            self.channel_metadata(ChannelActionType::Add, address, filter.as_ref(), explicit)?;

        if let Some(entry) = data.graph.get(address) {
            if !explicit || entry.is_explicitly_subscribed() {
                return Err(ReplicantServerError::SubscriptionConflict {
                    address: address.clone(),
                });
            }
            // promote an implicit subscription
            if !self.filters_match(entry.filter(), filter.as_ref()) {
                self.update_locked(data, change_set, address, filter)?;
            }
            data.graph.set_explicitly_subscribed(address, true)?;
            debug!("promoted implicit subscription {}", address);
            return Ok(SubscribeResponse::Delivered { etag: None });
        }

        let ChannelContent {
            changes,
            links,
            etag,
        } = self
            .loader
            .load(&Channel::new(address.clone(), filter.clone()))
            .map_err(|reason| rejected(address, ChannelActionType::Add, &reason))?;
        let etag = etag.filter(|_| channel.is_cache_enabled());

        data.graph
            .create_entry(address.clone(), filter.clone(), explicit)?;

        if let Some(etag) = &etag {
            if origin == SubscribeOrigin::Request && data.etags.get(address) == Some(etag) {
                debug!("channel {} is current in client cache {}", address, etag);
                return Ok(SubscribeResponse::UseCache { etag: etag.clone() });
            }
            data.etags.insert(address.clone(), etag.clone());
        }

        change_set.add_channel_action(ChannelAction::add(address.clone(), filter));
        for change in changes {
            change_set.merge_change(change.with_channel(address.clone()));
        }
        for link in &links {
            self.follow_link(data, change_set, link);
        }
        debug!(
            "subscribed {} {}",
            if explicit { "explicitly" } else { "implicitly" },
            address
        );

        Ok(SubscribeResponse::Delivered { etag })
    }

    fn update_locked(
        &self,
        data: &mut SessionData,
        change_set: &mut ChangeSet,
        address: &ChannelAddress,
        filter: Option<Filter>,
    ) -> Result<(), ReplicantServerError> {
        self.channel_metadata(ChannelActionType::Update, address, filter.as_ref(), true)?;
        let Some(entry) = data.graph.get(address) else {
            return Err(ReplicantServerError::NotSubscribed {
                address: address.clone(),
            });
        };

        let previous = entry.filter().cloned();
        let content = self
            .loader
            .load_update(address, previous.as_ref(), filter.as_ref())
            .map_err(|reason| rejected(address, ChannelActionType::Update, &reason))?;

        let retained: BTreeSet<&ChannelAddress> = content
            .links
            .iter()
            .filter(|link| link.source() == address)
            .map(ChannelLink::target)
            .collect();
        let dropped: Vec<ChannelAddress> = entry
            .outward_subscriptions()
            .iter()
            .filter(|target| !retained.contains(target))
            .cloned()
            .collect();

        if let Some(entry) = data.graph.get_mut(address) {
            entry.set_filter(filter.clone());
        }
        change_set.add_channel_action(ChannelAction::update(address.clone(), filter));
        for change in content.changes {
            change_set.merge_change(change.with_channel(address.clone()));
        }
        for link in &content.links {
            self.follow_link(data, change_set, link);
        }
        if !dropped.is_empty() {
            for removed in data.graph.deregister_outward_subscriptions(address, &dropped) {
                change_set.add_channel_action(ChannelAction::remove(removed));
            }
        }
        debug!("updated subscription {}", address);

        Ok(())
    }

    /// Implicitly subscribes a link's target if the link's source is
    /// subscribed. A target that cannot be subscribed is skipped.
    pub(crate) fn follow_link(
        &self,
        data: &mut SessionData,
        change_set: &mut ChangeSet,
        link: &ChannelLink,
    ) {
        let (source, target) = (link.source(), link.target());
        if !data.graph.contains(source) {
            trace!("ignoring link from unsubscribed channel {}", source);
            return;
        }

        if !data.graph.contains(target) {
            if let Err(error) = self.subscribe_locked(
                data,
                change_set,
                target,
                link.target_filter().cloned(),
                SubscribeOrigin::Link,
            ) {
                warn!("Unable to follow link {} -> {}: {}", source, target, error);
                return;
            }
        }
        data.graph
            .register_outward_subscriptions(source, std::slice::from_ref(target));
    }

    fn route_message(
        &self,
        data: &mut SessionData,
        change_set: &mut ChangeSet,
        message: &EntityMessage,
    ) {
        let channels: Vec<ChannelAddress> = message
            .routing_channels()
            .iter()
            .filter(|address| match data.graph.get(address) {
                Some(entry) => match entry.filter() {
                    Some(filter) => self.loader.accepts_entity(
                        &Channel::new((*address).clone(), Some(filter.clone())),
                        message,
                    ),
                    None => true,
                },
                None => false,
            })
            .cloned()
            .collect();
        if !channels.is_empty() {
            change_set.merge_change(message.to_change(channels));
        }

        for link in message.links() {
            self.follow_link(data, change_set, link);
        }
    }

    /// Instance channels rooted at deleted entities, which are marked deleted
    fn deleted_instance_channels(&self, messages: &[EntityMessage]) -> Vec<ChannelAddress> {
        let mut deleted = Vec::new();
        for message in messages.iter().filter(|message| message.is_delete()) {
            let key = message.key();
            for channel in self.system.channels_rooted_at(key.type_id()) {
                deleted.push(ChannelAddress::instance_channel(
                    channel.channel_id(),
                    key.entity_id(),
                ));
            }
        }

        if !deleted.is_empty() {
            self.deleted_instances
                .write()
                .extend(deleted.iter().cloned());
        }
        deleted
    }
}

fn unsubscribe_locked(
    data: &mut SessionData,
    change_set: &mut ChangeSet,
    address: &ChannelAddress,
) -> Result<(), ReplicantServerError> {
    let explicit = data
        .graph
        .get(address)
        .is_some_and(|entry| entry.is_explicitly_subscribed());
    if !explicit {
        return Err(ReplicantServerError::NotSubscribed {
            address: address.clone(),
        });
    }

    for removed in data.graph.set_explicitly_subscribed(address, false)? {
        change_set.add_channel_action(ChannelAction::remove(removed));
    }

    Ok(())
}

fn bad_session(key: &SessionKey) -> ReplicantServerError {
    ReplicantServerError::BadSession {
        key: key.to_string(),
    }
}

fn rejected(
    address: &ChannelAddress,
    action: ChannelActionType,
    reason: &str,
) -> ReplicantServerError {
    ReplicantServerError::ChannelActionRejected {
        address: address.clone(),
        action,
        reason: reason.to_string(),
    }
}
