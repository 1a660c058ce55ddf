//! CLI command implementations

pub mod config;
pub mod credential;
pub mod output;
pub mod results;
pub mod watch;
