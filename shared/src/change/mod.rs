pub mod change;
pub mod change_set;
