pub mod action;
pub mod address;
pub mod error;
pub mod filter;
