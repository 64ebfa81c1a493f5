use async_trait::async_trait;

use crate::domain::value_objects::{AuthorId, CategoryId};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログサービスポート
///
/// 台帳コンテキストと外部カタログコンテキストの境界を維持する。
/// 台帳コンテキストは著者・カテゴリのIDのみを知り、詳細は知らない。
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// 著者が存在するか確認する
    ///
    /// 書籍登録前の参照整合性チェックに使用される。
    async fn author_exists(&self, author_id: AuthorId) -> Result<bool>;

    /// カテゴリが存在するか確認する
    ///
    /// 書籍登録前の参照整合性チェックに使用される。
    async fn category_exists(&self, category_id: CategoryId) -> Result<bool>;
}
