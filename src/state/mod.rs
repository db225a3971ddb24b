pub mod config_state;
pub mod package_state;
pub mod post_init;
pub mod preference_state;
pub mod resolution_state;
pub mod state_manager;

pub use state_manager::{State, StatePaths};
