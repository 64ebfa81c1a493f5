pub mod catalog_service;
pub mod ledger_store;

// パブリックに型を再エクスポート
pub use catalog_service::CatalogService as MemoryCatalogService;
pub use ledger_store::LedgerStore as MemoryLedgerStore;
