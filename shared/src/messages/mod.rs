pub mod client_message;
pub mod server_message;
pub mod update_message;
