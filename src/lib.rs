// Public API for the command layer and integration tests

pub mod display;
pub mod matcher;
pub mod state;
pub mod store;
pub mod types;

mod scheduler;
