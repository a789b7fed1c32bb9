//! Reload notifier adapters.

pub mod http;
pub mod signal;

pub use http::HttpReloadNotifier;
pub use signal::SignalReloadNotifier;
