pub mod helpers;
pub mod test_system;

pub use helpers::*;
pub use test_system::{
    address, catalog, hidden, person, person_delete, person_update, system, TestChannelLoader,
    ADDRESS, ADDRESS_TYPE, CATALOG, FILTERED, HIDDEN, PERSON, PERSON_TYPE,
};
