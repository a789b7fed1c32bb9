//! Service layer: the reconciliation and convergence logic.

pub mod datasource_loop;
pub mod inspector;
pub mod resource_reconciler;
pub mod scrape_discovery;
pub mod scrape_loop;

pub use datasource_loop::DatasourceLoop;
pub use inspector::StateInspector;
pub use resource_reconciler::ResourceReconciler;
pub use scrape_discovery::ScrapeDiscovery;
pub use scrape_loop::{ConvergeOutcome, ScrapeConfigLoop, ScrapeLoopIntervals};
