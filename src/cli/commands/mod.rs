//! Command implementations.

pub mod datasource_loop;
pub mod provision;
pub mod run;
pub mod scrape_loop;
