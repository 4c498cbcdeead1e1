pub mod change_transaction;
pub mod entity_message;
pub mod request_handler;
pub mod session_manager;
