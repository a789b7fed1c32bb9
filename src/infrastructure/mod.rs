//! Infrastructure layer
//!
//! Adapters for the port traits: the platform HTTP client and CLI deployer,
//! the dashboard HTTP client, reload notifiers, plus configuration loading
//! and logging setup.

pub mod config;
pub mod dashboard;
pub mod logging;
pub mod platform;
pub mod reload;
