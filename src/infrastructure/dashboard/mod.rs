//! Dashboard tool adapters.

pub mod http;

pub use http::HttpDashboardApi;
