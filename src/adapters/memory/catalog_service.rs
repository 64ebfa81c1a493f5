use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::{AuthorId, CategoryId};
use crate::ports::catalog_service::{CatalogService as CatalogServiceTrait, Result};

/// インメモリ実装：カタログサービス
///
/// 既知の著者IDとカテゴリIDを保存することで状態を持ったテストを
/// サポート。登録済みのIDのみ存在するとみなす。
pub struct CatalogService {
    known_authors: Mutex<HashSet<AuthorId>>,
    known_categories: Mutex<HashSet<CategoryId>>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self {
            known_authors: Mutex::new(HashSet::new()),
            known_categories: Mutex::new(HashSet::new()),
        }
    }

    /// テスト用に既知の著者を登録
    pub fn add_author(&self, author_id: AuthorId) {
        self.known_authors.lock().unwrap().insert(author_id);
    }

    /// テスト用に既知のカテゴリを登録
    pub fn add_category(&self, category_id: CategoryId) {
        self.known_categories.lock().unwrap().insert(category_id);
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogServiceTrait for CatalogService {
    /// 登録された著者の中に存在するかチェック
    async fn author_exists(&self, author_id: AuthorId) -> Result<bool> {
        Ok(self.known_authors.lock().unwrap().contains(&author_id))
    }

    /// 登録されたカテゴリの中に存在するかチェック
    async fn category_exists(&self, category_id: CategoryId) -> Result<bool> {
        Ok(self.known_categories.lock().unwrap().contains(&category_id))
    }
}
