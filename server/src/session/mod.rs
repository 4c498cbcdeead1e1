pub mod session;
pub mod session_key;
pub mod status;
pub mod subscription_entry;
pub mod subscription_graph;
