use log::trace;
use thiserror::Error;

use replicant_client::ReplicantClientError;
use replicant_server::{ReplicantServerError, SessionKey};

use crate::{TestClient, TestServer};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Server failed: {0}")]
    Server(#[from] ReplicantServerError),

    #[error("Client failed: {0}")]
    Client(#[from] ReplicantClientError),
}

/// Delivers every queued client request to the server and everything the
/// server answers back, until neither side has anything left to send.
/// Packets a request produced are delivered before its reply.
pub fn exchange_packets(server: &TestServer, client: &mut TestClient) -> Result<(), ExchangeError> {
    let Some(key) = client.session().cloned() else {
        return Ok(());
    };

    loop {
        let requests = client.connection_mut().take_outgoing();
        let mut progressed = !requests.is_empty();

        for text in requests {
            trace!("client -> server: {}", text);
            let reply = server.manager().process_message(&key, &text);
            deliver_packets(server, client, &key)?;
            client.receive(reply)?;
        }
        progressed |= deliver_packets(server, client, &key)?;
        client.converger_mut().update();

        if !progressed {
            return Ok(());
        }
    }
}

pub fn exchange_packets_n_times(
    server: &TestServer,
    client: &mut TestClient,
    n: usize,
) -> Result<(), ExchangeError> {
    for _ in 0..n {
        exchange_packets(server, client)?;
    }
    Ok(())
}

/// Runs one converge pass and exchanges until idle
pub fn converge_and_exchange(
    server: &TestServer,
    client: &mut TestClient,
) -> Result<(), ExchangeError> {
    client.converger_mut().converge();
    exchange_packets(server, client)
}

fn deliver_packets(
    server: &TestServer,
    client: &mut TestClient,
    key: &SessionKey,
) -> Result<bool, ExchangeError> {
    let mut delivered = false;
    while let Some(message) = server
        .manager()
        .poll_message(key, client.connection().last_sequence_acked())?
    {
        delivered = true;
        client.receive(message)?;
    }
    Ok(delivered)
}
