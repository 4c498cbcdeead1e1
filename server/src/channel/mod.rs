pub mod loader;
pub mod metadata;
