//! Domain layer: data model, port traits, and error taxonomy.

pub mod errors;
pub mod models;
pub mod ports;
