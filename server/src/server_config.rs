use std::{default::Default, time::Duration};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Determines whether to require that a session sends an `auth` message
    /// before any other request (except `ping`) is processed.
    pub require_auth: bool,
    /// Sessions that receive no request for longer than this are closed by
    /// `remove_idle_sessions`
    pub session_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: false,
            session_timeout: Duration::from_secs(300),
        }
    }
}
