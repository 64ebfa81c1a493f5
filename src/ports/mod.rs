pub mod catalog_service;
pub mod ledger_store;

pub use catalog_service::CatalogService;
pub use ledger_store::{LedgerStore, StoreError};
