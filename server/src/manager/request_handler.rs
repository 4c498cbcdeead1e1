use log::{debug, info, warn};
use serde_json::Value;

use replicant_shared::{decode_client_message, ClientMessage, ServerMessage, WireError};

use crate::{
    EntityMessage, ReplicantServerError, ReplicantSession, ReplicantSessionManager, SessionKey,
    SubscribeResponse,
};

/// What an application command produced
#[derive(Debug, Clone, Default)]
pub struct CommandOutcome {
    /// Returned to the calling session in the packet answering the request
    pub response: Option<Value>,
    /// Committed with the calling request as origin
    pub messages: Vec<EntityMessage>,
}

/// Executes `exec` requests. Implemented by the application.
pub trait CommandHandler: Send + Sync {
    fn execute(
        &self,
        session: &SessionKey,
        command: &str,
        payload: Option<&Value>,
    ) -> Result<CommandOutcome, String>;
}

/// Decides whether an `auth` token is acceptable for a session
pub trait TokenValidator: Send + Sync {
    fn validate(&self, session: &SessionKey, token: &str) -> bool;
}

impl<F: Fn(&SessionKey, &str) -> bool + Send + Sync> TokenValidator for F {
    fn validate(&self, session: &SessionKey, token: &str) -> bool {
        self(session, token)
    }
}

impl ReplicantSessionManager {
    /// Decodes one control message from a session's client and answers it.
    ///
    /// Packets produced by the request are queued before the answer is
    /// returned. Failures never escape: they are answered with an error
    /// message and recorded as the session's last error.
    pub fn process_message(&self, key: &SessionKey, text: &str) -> ServerMessage {
        let session = match self.session(key) {
            Ok(session) => session,
            Err(error) => {
                warn!("Rejected message for unknown session {}", key);
                return ServerMessage::Error {
                    request_id: None,
                    message: error.to_string(),
                };
            }
        };
        session.touch();

        let message = match decode_client_message(text) {
            Ok(message) => message,
            Err(WireError::UnknownRequestType { request_type }) => {
                warn!("Session {} sent unknown request type {}", key, request_type);
                return ServerMessage::UnknownRequestType {
                    request: request_type,
                };
            }
            Err(error) => {
                warn!("Session {} sent malformed message: {}", key, error);
                let message = error.to_string();
                session.record_error(error.into());
                return ServerMessage::MalformedMessage { message };
            }
        };

        let request_id = message.request_id().to_string();
        let message_type = message.message_type();
        match self.dispatch(&session, message) {
            Ok(response) => {
                debug!(
                    "Session {} completed {} request {}",
                    key, message_type, request_id
                );
                response
            }
            Err(error) => {
                warn!(
                    "Session {} failed {} request {}: {}",
                    key, message_type, request_id, error
                );
                let message = error.to_string();
                session.record_error(error);
                ServerMessage::Error {
                    request_id: Some(request_id),
                    message,
                }
            }
        }
    }

    fn dispatch(
        &self,
        session: &ReplicantSession,
        message: ClientMessage,
    ) -> Result<ServerMessage, ReplicantServerError> {
        let key = session.key();

        if self.config().require_auth
            && !session.is_authenticated()
            && !matches!(
                message,
                ClientMessage::Auth { .. } | ClientMessage::Ping { .. }
            )
        {
            return Err(ReplicantServerError::NotAuthenticated {
                key: key.to_string(),
                request_type: message.message_type().to_string(),
            });
        }

        match message {
            ClientMessage::Auth { request_id, token } => {
                if !self.validate_token(key, &token) {
                    return Err(ReplicantServerError::NotAuthenticated {
                        key: key.to_string(),
                        request_type: "auth".to_string(),
                    });
                }
                session.lock().authenticated = true;
                info!("Session {} authenticated", key);
                Ok(ServerMessage::Ok { request_id })
            }
            ClientMessage::ETags { request_id, etags } => {
                self.record_etags(key, etags)?;
                Ok(ServerMessage::Ok { request_id })
            }
            ClientMessage::Ping { request_id } => Ok(ServerMessage::Ok { request_id }),
            ClientMessage::Subscribe {
                request_id,
                channel,
                filter,
            } => {
                // re-subscribing with another filter is how clients update
                let filter_changed = session.subscription_entry(&channel).is_some_and(|entry| {
                    entry.is_explicitly_subscribed()
                        && !self.filters_match(entry.filter(), filter.as_ref())
                });
                if filter_changed {
                    self.update_subscription(key, &request_id, &channel, filter)?;
                    return Ok(ServerMessage::Ok { request_id });
                }

                match self.subscribe(key, &request_id, &channel, filter)? {
                    SubscribeResponse::Delivered { .. } => Ok(ServerMessage::Ok { request_id }),
                    SubscribeResponse::UseCache { etag } => Ok(ServerMessage::UseCache {
                        request_id,
                        channel,
                        etag,
                    }),
                }
            }
            ClientMessage::Unsubscribe {
                request_id,
                channel,
            } => {
                self.unsubscribe(key, &request_id, &channel)?;
                Ok(ServerMessage::Ok { request_id })
            }
            ClientMessage::BulkSubscribe {
                request_id,
                channels,
                filter,
            } => {
                self.bulk_subscribe(key, &request_id, &channels, filter)?;
                Ok(ServerMessage::Ok { request_id })
            }
            ClientMessage::BulkUnsubscribe {
                request_id,
                channels,
            } => {
                self.bulk_unsubscribe(key, &request_id, &channels)?;
                Ok(ServerMessage::Ok { request_id })
            }
            ClientMessage::Exec {
                request_id,
                command,
                payload,
            } => {
                let Some(handler) = self.command_handler() else {
                    return Err(ReplicantServerError::CommandFailed {
                        command,
                        reason: "no command handler is installed".to_string(),
                    });
                };
                let outcome = handler
                    .execute(key, &command, payload.as_ref())
                    .map_err(|reason| ReplicantServerError::CommandFailed {
                        command: command.clone(),
                        reason,
                    })?;

                let mut transaction = self.begin_transaction();
                for message in outcome.messages {
                    transaction.record(message);
                }
                transaction.commit(Some((key, &request_id)), outcome.response)?;

                Ok(ServerMessage::Ok { request_id })
            }
        }
    }
}
