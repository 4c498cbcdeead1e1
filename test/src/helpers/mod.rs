pub mod assertions;
pub mod packet_exchange;
pub mod test_client;
pub mod test_server;

pub use packet_exchange::{
    converge_and_exchange, exchange_packets, exchange_packets_n_times, ExchangeError,
};
pub use test_client::TestClient;
pub use test_server::TestServer;
