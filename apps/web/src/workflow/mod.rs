pub mod driver;
pub mod progress;
pub mod skill_gap;
pub mod upload;
pub mod wizard;
