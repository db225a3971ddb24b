pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod registry;
pub mod state;
pub mod utils;
