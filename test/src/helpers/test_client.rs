use std::time::Duration;

use replicant_client::{
    shared::{Change, ChannelAddress, Filter},
    AreaOfInterestStatus, ClientConfig, Connection, ContextConverger, ReplicantClientError,
};
use replicant_server::{shared::ServerMessage, SessionKey};

/// A client context converging over a `Connection`. The converge timer
/// never rings on its own; tests converge explicitly.
pub struct TestClient {
    session: Option<SessionKey>,
    converger: ContextConverger<Connection>,
    entity_changes: Vec<Change>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig {
            converge_interval: Duration::from_secs(3600),
            ..ClientConfig::default()
        })
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let mut converger = ContextConverger::new(Connection::new(), config);
        converger.activate();
        Self {
            session: None,
            converger,
            entity_changes: Vec::new(),
        }
    }

    pub(crate) fn open_session(&mut self, key: SessionKey, session_id: String) {
        self.session = Some(key);
        let created = ServerMessage::SessionCreated { session_id };
        if let Err(error) = self.connection_mut().receive(created) {
            log::warn!("Unable to open session: {}", error);
        }
    }

    pub fn session(&self) -> Option<&SessionKey> {
        self.session.as_ref()
    }

    pub fn converger(&self) -> &ContextConverger<Connection> {
        &self.converger
    }

    pub fn converger_mut(&mut self) -> &mut ContextConverger<Connection> {
        &mut self.converger
    }

    pub fn connection(&self) -> &Connection {
        self.converger.connector()
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        self.converger.connector_mut()
    }

    pub fn declare(&mut self, address: &ChannelAddress, filter: Option<Filter>) {
        self.converger.add_area_of_interest(address, filter);
    }

    pub fn release(&mut self, address: &ChannelAddress) {
        self.converger.release_area_of_interest(address);
    }

    pub fn status(&self, address: &ChannelAddress) -> Option<AreaOfInterestStatus> {
        self.converger
            .areas()
            .find(address)
            .map(|area| area.status())
    }

    pub(crate) fn receive(&mut self, message: ServerMessage) -> Result<(), ReplicantClientError> {
        self.converger.connector_mut().receive(message)?;
        let changes = self.converger.connector_mut().take_entity_changes();
        self.entity_changes.extend(changes);
        Ok(())
    }

    /// Entity changes applied so far, in application order
    pub fn entity_changes(&self) -> &[Change] {
        &self.entity_changes
    }

    pub fn clear_entity_changes(&mut self) {
        self.entity_changes.clear();
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
