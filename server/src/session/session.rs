use std::{collections::BTreeMap, time::Duration};

use parking_lot::{Mutex, MutexGuard};

use replicant_shared::{ChannelAddress, ETag, Instant, PacketQueue, ServerMessage, Timestamp};

use crate::{
    ReplicantServerError, SessionKey, SessionState, SessionStatus, SubscriptionEntry,
    SubscriptionGraph, SubscriptionStatus,
};

/// Mutable state of a session. Always accessed under the session lock, so
/// queue, graph and bookkeeping change together.
pub(crate) struct SessionData {
    pub(crate) queue: PacketQueue,
    pub(crate) graph: SubscriptionGraph,
    pub(crate) etags: BTreeMap<ChannelAddress, ETag>,
    pub(crate) last_error: Option<ReplicantServerError>,
    pub(crate) authenticated: bool,
    pub(crate) state: SessionState,
    last_access: Instant,
    last_accessed_at: u64,
}

impl SessionData {
    fn new() -> Self {
        Self {
            queue: PacketQueue::new(),
            graph: SubscriptionGraph::new(),
            etags: BTreeMap::new(),
            last_error: None,
            authenticated: false,
            state: SessionState::Open,
            last_access: Instant::now(),
            last_accessed_at: Timestamp::now_or_zero(),
        }
    }
}

/// One client's session: its outbound packet queue and its subscriptions
pub struct ReplicantSession {
    key: SessionKey,
    created_at: u64,
    data: Mutex<SessionData>,
}

impl ReplicantSession {
    pub(crate) fn new(key: SessionKey) -> Self {
        Self {
            key,
            created_at: Timestamp::now_or_zero(),
            data: Mutex::new(SessionData::new()),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Milliseconds since the unix epoch
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.data.lock().state
    }

    pub fn last_accessed_at(&self) -> u64 {
        self.data.lock().last_accessed_at
    }

    pub fn last_error(&self) -> Option<ReplicantServerError> {
        self.data.lock().last_error.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.lock().authenticated
    }

    pub fn queue_size(&self) -> usize {
        self.data.lock().queue.size()
    }

    pub fn is_subscribed(&self, address: &ChannelAddress) -> bool {
        self.data.lock().graph.contains(address)
    }

    /// Copy of the entry for `address`, if subscribed
    pub fn subscription_entry(&self, address: &ChannelAddress) -> Option<SubscriptionEntry> {
        self.data.lock().graph.get(address).cloned()
    }

    /// Copies of every live entry, in address order
    pub fn subscription_entries(&self) -> Vec<SubscriptionEntry> {
        self.data.lock().graph.entries().cloned().collect()
    }

    /// The message announcing this session to its client
    pub fn session_created_message(&self) -> ServerMessage {
        ServerMessage::SessionCreated {
            session_id: self.key.to_string(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        let data = self.data.lock();
        SessionStatus {
            key: self.key.clone(),
            state: data.state,
            created_at: self.created_at,
            last_accessed_at: data.last_accessed_at,
            last_error: data.last_error.as_ref().map(ToString::to_string),
            queue_size: data.queue.size(),
            last_sequence_acked: data.queue.last_sequence_acked(),
            subscriptions: data.graph.entries().map(SubscriptionStatus::from).collect(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionData> {
        self.data.lock()
    }

    pub(crate) fn touch(&self) {
        let mut data = self.data.lock();
        data.last_access = Instant::now();
        data.last_accessed_at = Timestamp::now_or_zero();
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.data.lock().last_access.elapsed()
    }

    pub(crate) fn record_error(&self, error: ReplicantServerError) {
        self.data.lock().last_error = Some(error);
    }

    /// Disposes the queue and every subscription in one step
    pub(crate) fn close(&self) {
        let mut data = self.data.lock();
        data.queue.clear();
        data.graph.clear();
        data.etags.clear();
        data.state = SessionState::Closed;
    }
}
