use serde::{Deserialize, Serialize};

use super::{
    AuthorId, BookId, CategoryId, CopyCount, DeleteBookError, Isbn, ReserveCopyError,
    ResizeCopiesError,
};

/// Book集約 - 1タイトルの書籍と在庫カウンタ
///
/// 不変条件：
/// - 0 <= available_copies <= total_copies
/// - total_copies - available_copies = 貸出中の貸出件数
///
/// 在庫カウンタは本モジュールの純粋関数経由でのみ変化する。
/// 並行実行時の直列化はストア側のトランザクション境界が担う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    // 識別子
    pub book_id: BookId,

    // 書誌情報
    pub title: String,
    pub isbn: Isbn,

    // 外部カタログコンテキストへの参照（IDのみ）
    pub author_id: AuthorId,
    pub category_id: CategoryId,

    // 在庫カウンタ
    pub total_copies: CopyCount,
    pub available_copies: u32,
}

impl Book {
    /// 新規登録時の書籍を生成する
    ///
    /// ビジネスルール：
    /// - 登録直後は全部数が貸出可能（available = total）
    pub fn new(
        book_id: BookId,
        title: impl Into<String>,
        isbn: Isbn,
        author_id: AuthorId,
        category_id: CategoryId,
        total_copies: CopyCount,
    ) -> Self {
        Self {
            book_id,
            title: title.into(),
            isbn,
            author_id,
            category_id,
            total_copies,
            available_copies: total_copies.value(),
        }
    }

    /// 貸出中の件数（カウンタから導出）
    pub fn active_loans(&self) -> u32 {
        self.total_copies.value() - self.available_copies
    }

    /// 純粋関数：在庫を1部確保する
    ///
    /// ビジネスルール：
    /// - available_copiesが0のときは確保できない（過剰貸出の防止）
    ///
    /// 副作用なし。新しいBookを返す。
    pub fn reserve_copy(self) -> Result<Book, ReserveCopyError> {
        if self.available_copies == 0 {
            return Err(ReserveCopyError::OutOfStock);
        }
        Ok(Book {
            available_copies: self.available_copies - 1,
            ..self
        })
    }

    /// 純粋関数：在庫を1部戻す
    ///
    /// 呼び出し側は貸出中の貸出1件の返却につき、ちょうど1回だけ呼ぶ。
    /// 台帳整合性の下では available_copies < total_copies が保証される。
    ///
    /// 副作用なし。新しいBookを返す。
    pub fn release_copy(self) -> Book {
        Book {
            available_copies: self.available_copies + 1,
            ..self
        }
    }

    /// 純粋関数：総部数を変更する
    ///
    /// ビジネスルール：
    /// - 新しい総部数が貸出中の件数を下回る縮小は拒否する
    /// - 変更後は available = new_total - 貸出中件数 に再計算する
    ///
    /// 副作用なし。新しいBookを返す。
    pub fn resize(self, new_total: CopyCount) -> Result<Book, ResizeCopiesError> {
        let active = self.active_loans();
        if new_total.value() < active {
            return Err(ResizeCopiesError::BelowActiveLoans { active });
        }
        Ok(Book {
            total_copies: new_total,
            available_copies: new_total.value() - active,
            ..self
        })
    }

    /// 削除可能か（貸出中の貸出が1件もないか）
    pub fn can_delete(&self) -> bool {
        self.active_loans() == 0
    }

    /// 削除ガード
    ///
    /// ビジネスルール：
    /// - 貸出中の貸出が残っている書籍は削除できない
    /// - 全件返却済みになれば削除できる（貸出履歴は削除されず残る）
    pub fn check_delete(&self) -> Result<(), DeleteBookError> {
        let active = self.active_loans();
        if active > 0 {
            return Err(DeleteBookError::HasActiveLoans { active });
        }
        Ok(())
    }
}
