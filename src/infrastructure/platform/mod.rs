//! Platform adapters: authenticated HTTP client and CLI deployment sink.

pub mod cli;
pub mod http;
pub mod session;

pub use cli::CliDeployer;
pub use http::HttpPlatformClient;
pub use session::Session;
