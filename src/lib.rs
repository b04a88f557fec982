pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod source;
pub mod state;
