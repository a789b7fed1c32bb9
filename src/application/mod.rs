//! Application layer: engine supervision and one-shot provisioning.

pub mod engine;
pub mod provisioner;

pub use engine::Engine;
pub use provisioner::Provisioner;
