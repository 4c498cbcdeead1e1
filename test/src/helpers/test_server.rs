use replicant_server::{
    shared::ServerMessage, EntityMessage, ReplicantServerError, ReplicantSessionManager,
    ServerConfig, SessionKey,
};

use crate::{system, TestChannelLoader, TestClient};

/// A session manager over the test system, with a loader the test can edit
pub struct TestServer {
    manager: ReplicantSessionManager,
    loader: TestChannelLoader,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let loader = TestChannelLoader::new();
        Self {
            manager: ReplicantSessionManager::new(config, system(), loader.clone()),
            loader,
        }
    }

    pub fn manager(&self) -> &ReplicantSessionManager {
        &self.manager
    }

    pub fn loader(&self) -> &TestChannelLoader {
        &self.loader
    }

    /// Opens a session for `client` and hands it the session id
    pub fn connect(&self, client: &mut TestClient) -> SessionKey {
        let session = self.manager.create_session();
        let key = session.key().clone();
        if let ServerMessage::SessionCreated { session_id } = session.session_created_message() {
            client.open_session(key.clone(), session_id);
        }
        key
    }

    /// Commits entity messages that no session requested
    pub fn commit(&self, messages: Vec<EntityMessage>) -> Result<(), ReplicantServerError> {
        let mut transaction = self.manager.begin_transaction();
        for message in messages {
            transaction.record(message);
        }
        transaction.commit(None, None)
    }
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}
