pub mod analysis;
pub mod credits;
pub mod tailoring;
