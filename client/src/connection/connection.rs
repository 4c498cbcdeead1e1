use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    mem,
};

use log::{debug, info, trace, warn};
use serde_json::Value;

use replicant_shared::{
    decode_packet, decode_server_message, encode_client_message, Change, ChangeSet,
    ChannelActionType, ChannelAddress, ClientMessage, ETag, Filter, Packet, PacketQueue,
    PacketSequence, RequestId, ServerMessage,
};

use crate::{Connector, ConnectorError, ConnectorEvent, ReplicantClientError};

#[derive(Debug, Clone)]
enum PendingRequest {
    Subscribe {
        addresses: Vec<ChannelAddress>,
        filter: Option<Filter>,
    },
    Update {
        address: ChannelAddress,
        filter: Option<Filter>,
    },
    Unsubscribe {
        addresses: Vec<ChannelAddress>,
    },
    Other,
}

impl PendingRequest {
    /// Subscription requests are answered by a packet carrying their id
    fn expects_packet(&self) -> bool {
        !matches!(self, PendingRequest::Other)
    }
}

struct PendingEntry {
    request: PendingRequest,
    answered: bool,
    processed: bool,
}

/// Unclaimed exec responses held for `take_response`. Reaching the limit
/// discards every unclaimed response.
const MAX_UNCLAIMED_RESPONSES: usize = 256;

struct CachedChannel {
    etag: ETag,
    change_set: ChangeSet,
}

/// Client end of the wire protocol, without a transport.
///
/// Requests are encoded into an outbox the transport drains with
/// `take_outgoing`; whatever the transport receives is handed to `receive`.
/// Update packets pass through a `PacketQueue` so they are applied strictly
/// in sequence, and a request only completes once it is answered and every
/// packet carrying its id has been applied.
pub struct Connection {
    session_id: Option<String>,
    connected: bool,
    next_request_id: u64,
    outgoing: VecDeque<String>,
    pending: HashMap<RequestId, PendingEntry>,
    // Small buffer when receiving packets from the server to make sure they
    // are applied in order
    inbound: PacketQueue,
    events: Vec<ConnectorEvent>,
    entity_changes: Vec<Change>,
    responses: HashMap<RequestId, Value>,
    cache: BTreeMap<ChannelAddress, CachedChannel>,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            session_id: None,
            connected: false,
            next_request_id: 0,
            outgoing: VecDeque::new(),
            pending: HashMap::new(),
            inbound: PacketQueue::new(),
            events: Vec::new(),
            entity_changes: Vec::new(),
            responses: HashMap::new(),
            cache: BTreeMap::new(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Sequence to acknowledge when polling for the next packet
    pub fn last_sequence_acked(&self) -> PacketSequence {
        self.inbound.last_sequence_acked()
    }

    /// Packets received ahead of a gap, waiting for the missing ones
    pub fn buffered_packet_count(&self) -> usize {
        self.inbound.size()
    }

    pub fn pending_request_count(&self) -> usize {
        self.pending.len()
    }

    pub fn take_outgoing(&mut self) -> Vec<String> {
        self.outgoing.drain(..).collect()
    }

    /// Entity changes of every applied packet, in application order
    pub fn take_entity_changes(&mut self) -> Vec<Change> {
        mem::take(&mut self.entity_changes)
    }

    /// Response payload of an `exec` request, once its packet was applied
    pub fn take_response(&mut self, request_id: &str) -> Option<Value> {
        self.responses.remove(request_id)
    }

    pub fn cached_etag(&self, address: &ChannelAddress) -> Option<&str> {
        self.cache.get(address).map(|cached| cached.etag.as_str())
    }

    /// Forgets the session. Pending requests fail as disconnected.
    pub fn disconnect(&mut self) {
        if let Some(session_id) = &self.session_id {
            info!("Disconnected from session {}", session_id);
        }
        self.connected = false;

        let pending: Vec<RequestId> = self.pending.keys().cloned().collect();
        for request_id in pending {
            self.fail(&request_id, ConnectorError::Disconnected);
        }
    }

    // Incoming

    pub fn receive_text(&mut self, text: &str) -> Result<(), ReplicantClientError> {
        let message = decode_server_message(text)?;
        self.receive(message)
    }

    pub fn receive(&mut self, message: ServerMessage) -> Result<(), ReplicantClientError> {
        match message {
            ServerMessage::SessionCreated { session_id } => {
                if self.session_id.is_some() {
                    self.reset_session();
                }
                info!("Connected to session {}", session_id);
                self.session_id = Some(session_id);
                self.connected = true;
                Ok(())
            }
            ServerMessage::Update(update) => {
                let packet = decode_packet(&update)?;
                trace!("received packet {}", packet.sequence());
                self.inbound.insert_packet(packet);
                self.process_packets();
                Ok(())
            }
            ServerMessage::Ok { request_id } => {
                let Some(entry) = self.pending.get_mut(&request_id) else {
                    return Err(unknown_request("ok", &request_id));
                };
                entry.answered = true;
                if entry.processed || !entry.request.expects_packet() {
                    self.complete(&request_id);
                } else {
                    debug!("request {} answered, waiting for its packets", request_id);
                }
                Ok(())
            }
            ServerMessage::UseCache {
                request_id,
                channel,
                etag,
            } => {
                if !self.pending.contains_key(&request_id) {
                    return Err(unknown_request("use-cache", &request_id));
                }
                let cached = self
                    .cache
                    .get(&channel)
                    .filter(|cached| cached.etag == etag)
                    .map(|cached| cached.change_set.clone());
                match cached {
                    Some(change_set) => {
                        debug!("using cached content of {} at {}", channel, etag);
                        self.apply_change_set(change_set);
                        self.complete(&request_id);
                    }
                    None => {
                        warn!("Server asked to reuse uncached content of {}", channel);
                        self.fail(
                            &request_id,
                            ConnectorError::Rejected {
                                message: format!("no cached content for {} at {}", channel, etag),
                            },
                        );
                    }
                }
                Ok(())
            }
            ServerMessage::Error {
                request_id: Some(request_id),
                message,
            } => {
                if !self.fail(&request_id, ConnectorError::Rejected { message }) {
                    return Err(unknown_request("error", &request_id));
                }
                Ok(())
            }
            ServerMessage::Error {
                request_id: None,
                message,
            } => {
                warn!("Server reported error: {}", message);
                Ok(())
            }
            ServerMessage::MalformedMessage { message } => {
                warn!("Server could not decode a request: {}", message);
                Ok(())
            }
            ServerMessage::UnknownRequestType { request } => {
                warn!("Server does not know request type {}", request);
                Ok(())
            }
        }
    }

    /// Drops everything tied to the previous session. Its requests will
    /// never be answered and packet sequencing restarts.
    fn reset_session(&mut self) {
        let pending: Vec<RequestId> = self.pending.keys().cloned().collect();
        for request_id in pending {
            self.fail(&request_id, ConnectorError::Disconnected);
        }
        self.outgoing.clear();
        self.inbound = PacketQueue::new();
        self.responses.clear();
        self.events.push(ConnectorEvent::SessionReset);
    }

    fn process_packets(&mut self) {
        while let Some(packet) = self.inbound.next_packet_to_process().cloned() {
            self.inbound.ack(packet.sequence());
            self.apply_packet(packet);
        }
        if !self.inbound.is_empty() {
            debug!(
                "holding {} packets until sequence {} arrives",
                self.inbound.size(),
                self.inbound.last_sequence_acked() + 1
            );
        }
    }

    fn apply_packet(&mut self, packet: Packet) {
        let request_id = packet.request_id().map(str::to_string);

        if let (Some(request_id), Some(etag)) = (&request_id, packet.etag()) {
            self.cache_channel(request_id, etag, packet.change_set());
        }
        self.apply_change_set(packet.change_set().clone());

        let Some(request_id) = request_id else {
            return;
        };
        if let Some(response) = packet.response() {
            if self.responses.len() >= MAX_UNCLAIMED_RESPONSES {
                warn!(
                    "Dropping {} unclaimed exec responses",
                    self.responses.len()
                );
                self.responses.clear();
            }
            self.responses.insert(request_id.clone(), response.clone());
        }
        if let Some(entry) = self.pending.get_mut(&request_id) {
            entry.processed = true;
            if entry.answered {
                self.complete(&request_id);
            }
        }
    }

    fn apply_change_set(&mut self, change_set: ChangeSet) {
        let (actions, changes) = change_set.into_parts();
        if !actions.is_empty() {
            self.events.push(ConnectorEvent::ChannelActions(actions));
        }
        self.entity_changes.extend(changes);
    }

    fn cache_channel(&mut self, request_id: &str, etag: &str, change_set: &ChangeSet) {
        let Some(PendingEntry {
            request: PendingRequest::Subscribe { addresses, .. },
            ..
        }) = self.pending.get(request_id)
        else {
            return;
        };
        if let [address] = addresses.as_slice() {
            self.cache.insert(
                address.clone(),
                CachedChannel {
                    etag: etag.to_string(),
                    change_set: change_set.clone(),
                },
            );
        }
    }

    fn complete(&mut self, request_id: &str) -> bool {
        let Some(entry) = self.pending.remove(request_id) else {
            return false;
        };
        let completed = |address: ChannelAddress, action, filter| ConnectorEvent::Completed {
            address,
            action,
            filter,
        };
        match entry.request {
            PendingRequest::Subscribe { addresses, filter } => {
                for address in addresses {
                    self.events
                        .push(completed(address, ChannelActionType::Add, filter.clone()));
                }
            }
            PendingRequest::Update { address, filter } => {
                self.events
                    .push(completed(address, ChannelActionType::Update, filter));
            }
            PendingRequest::Unsubscribe { addresses } => {
                for address in addresses {
                    self.events
                        .push(completed(address, ChannelActionType::Remove, None));
                }
            }
            PendingRequest::Other => {}
        }
        true
    }

    fn fail(&mut self, request_id: &str, error: ConnectorError) -> bool {
        let Some(entry) = self.pending.remove(request_id) else {
            return false;
        };
        let (addresses, action) = match entry.request {
            PendingRequest::Subscribe { addresses, .. } => (addresses, ChannelActionType::Add),
            PendingRequest::Update { address, .. } => (vec![address], ChannelActionType::Update),
            PendingRequest::Unsubscribe { addresses } => (addresses, ChannelActionType::Remove),
            PendingRequest::Other => {
                warn!("Request {} failed: {}", request_id, error);
                return true;
            }
        };
        for address in addresses {
            self.events.push(ConnectorEvent::Failed {
                address,
                action,
                error: error.clone(),
            });
        }
        true
    }

    // Outgoing

    pub fn authenticate(&mut self, token: &str) -> Result<RequestId, ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::Auth {
                request_id,
                token: token.to_string(),
            },
            PendingRequest::Other,
        )
    }

    pub fn ping(&mut self) -> Result<RequestId, ConnectorError> {
        let request_id = self.next_request_id();
        self.send(ClientMessage::Ping { request_id }, PendingRequest::Other)
    }

    /// Tells the server which cached channel contents this client holds
    pub fn send_etags(&mut self) -> Result<RequestId, ConnectorError> {
        let etags: BTreeMap<ChannelAddress, ETag> = self
            .cache
            .iter()
            .map(|(address, cached)| (address.clone(), cached.etag.clone()))
            .collect();
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::ETags { request_id, etags },
            PendingRequest::Other,
        )
    }

    pub fn exec(
        &mut self,
        command: &str,
        payload: Option<Value>,
    ) -> Result<RequestId, ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::Exec {
                request_id,
                command: command.to_string(),
                payload,
            },
            PendingRequest::Other,
        )
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id.to_string()
    }

    fn send(
        &mut self,
        message: ClientMessage,
        request: PendingRequest,
    ) -> Result<RequestId, ConnectorError> {
        if !self.is_connected() {
            return Err(ConnectorError::Disconnected);
        }
        let text = encode_client_message(&message).map_err(|error| ConnectorError::Transport {
            reason: error.to_string(),
        })?;

        let request_id = message.request_id().to_string();
        trace!("queued {} request {}", message.message_type(), request_id);
        self.outgoing.push_back(text);
        self.pending.insert(
            request_id.clone(),
            PendingEntry {
                request,
                answered: false,
                processed: false,
            },
        );

        Ok(request_id)
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for Connection {
    fn is_connected(&self) -> bool {
        self.connected && self.session_id.is_some()
    }

    fn request_subscribe(
        &mut self,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::Subscribe {
                request_id,
                channel: address.clone(),
                filter: filter.cloned(),
            },
            PendingRequest::Subscribe {
                addresses: vec![address.clone()],
                filter: filter.cloned(),
            },
        )?;
        Ok(())
    }

    fn request_bulk_subscribe(
        &mut self,
        addresses: &[ChannelAddress],
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::BulkSubscribe {
                request_id,
                channels: addresses.to_vec(),
                filter: filter.cloned(),
            },
            PendingRequest::Subscribe {
                addresses: addresses.to_vec(),
                filter: filter.cloned(),
            },
        )?;
        Ok(())
    }

    /// Sent as a `sub` with the new filter
    fn request_subscription_update(
        &mut self,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::Subscribe {
                request_id,
                channel: address.clone(),
                filter: filter.cloned(),
            },
            PendingRequest::Update {
                address: address.clone(),
                filter: filter.cloned(),
            },
        )?;
        Ok(())
    }

    fn request_unsubscribe(&mut self, address: &ChannelAddress) -> Result<(), ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::Unsubscribe {
                request_id,
                channel: address.clone(),
            },
            PendingRequest::Unsubscribe {
                addresses: vec![address.clone()],
            },
        )?;
        Ok(())
    }

    fn request_bulk_unsubscribe(
        &mut self,
        addresses: &[ChannelAddress],
    ) -> Result<(), ConnectorError> {
        let request_id = self.next_request_id();
        self.send(
            ClientMessage::BulkUnsubscribe {
                request_id,
                channels: addresses.to_vec(),
            },
            PendingRequest::Unsubscribe {
                addresses: addresses.to_vec(),
            },
        )?;
        Ok(())
    }

    fn drain_events(&mut self) -> Vec<ConnectorEvent> {
        mem::take(&mut self.events)
    }
}

fn unknown_request(message_type: &str, request_id: &str) -> ReplicantClientError {
    ReplicantClientError::UnexpectedMessage {
        message_type: message_type.to_string(),
        reason: format!("no pending request {}", request_id),
    }
}
