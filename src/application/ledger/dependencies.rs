use std::sync::Arc;

use crate::domain::AccessPolicy;
use crate::ports::{CatalogService, LedgerStore};

/// 台帳サービスが利用する依存関係
///
/// Ports層のトレイトオブジェクトを束ねる。本番ではPostgres実装、
/// テストではインメモリ実装を注入する。
#[derive(Clone)]
pub struct ServiceDependencies {
    /// 書籍在庫と貸出台帳の永続化
    pub ledger_store: Arc<dyn LedgerStore>,
    /// 著者・カテゴリの存在確認
    pub catalog_service: Arc<dyn CatalogService>,
    /// 操作ごとの認可ポリシー
    pub access_policy: Arc<AccessPolicy>,
}

impl ServiceDependencies {
    pub fn new(
        ledger_store: Arc<dyn LedgerStore>,
        catalog_service: Arc<dyn CatalogService>,
        access_policy: Arc<AccessPolicy>,
    ) -> Self {
        Self {
            ledger_store,
            catalog_service,
            access_policy,
        }
    }
}
