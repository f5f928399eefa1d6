//! Runtime adapters for Patchwright (config, descriptor discovery, the shared
//! catalog store, logging).

pub mod catalog_store;
pub mod config;
pub mod logging;

pub use catalog_store::CatalogStore;
pub use config::Config;
pub use logging::init_logging;
