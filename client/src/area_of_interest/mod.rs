pub mod area_of_interest;
pub mod service;
pub mod status;
