use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    BookId, CloseLoanError, CopyCount, DeleteBookError, LoanId, LoanScope, ReserveCopyError,
    ResizeCopiesError, book::Book, loan::Loan,
};

/// 台帳ストアのエラー
///
/// トランザクション境界の内側で検出される競合（在庫切れ、重複貸出など）は
/// 契約の一部であり、型付きで返す。インフラ障害のみBackendに畳み込む。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 書籍が見つからない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// ISBNが既に登録済み
    #[error("ISBN already registered")]
    DuplicateIsbn,

    /// 同一利用者が同一書籍を貸出中
    #[error("Holder already has an active loan for this book")]
    DuplicateActiveLoan,

    /// 貸出可能な部数が残っていない
    #[error("No copies available")]
    OutOfStock,

    /// 既に返却済み
    #[error("Loan already returned")]
    AlreadyReturned,

    /// 貸出中の件数を下回る縮小
    #[error("Cannot shrink below active loans ({active} active)")]
    BelowActiveLoans { active: u32 },

    /// 貸出中の貸出が残っている書籍の削除
    #[error("Book still has active loans ({active} active)")]
    HasActiveLoans { active: u32 },

    /// ストレージ基盤のエラー
    #[error("Storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<ReserveCopyError> for StoreError {
    fn from(err: ReserveCopyError) -> Self {
        match err {
            ReserveCopyError::OutOfStock => StoreError::OutOfStock,
        }
    }
}

impl From<CloseLoanError> for StoreError {
    fn from(err: CloseLoanError) -> Self {
        match err {
            CloseLoanError::AlreadyReturned => StoreError::AlreadyReturned,
        }
    }
}

impl From<ResizeCopiesError> for StoreError {
    fn from(err: ResizeCopiesError) -> Self {
        match err {
            ResizeCopiesError::BelowActiveLoans { active } => {
                StoreError::BelowActiveLoans { active }
            }
        }
    }
}

impl From<DeleteBookError> for StoreError {
    fn from(err: DeleteBookError) -> Self {
        match err {
            DeleteBookError::HasActiveLoans { active } => StoreError::HasActiveLoans { active },
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// 台帳ストアポート
///
/// 在庫カウンタと貸出台帳の永続化を抽象化する。
/// 各メソッドは書籍単位の直列化境界（行ロックまたは書籍単位のミューテックス）の
/// 内側でcheck-then-actを実行し、全か無かで完了する。
/// 異なる書籍への操作が互いをブロックしてはならない。
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 書籍を登録する
    ///
    /// ISBNの一意性はここで検査され、重複はDuplicateIsbnを返す。
    async fn insert_book(&self, book: &Book) -> Result<()>;

    /// 書籍を取得する
    async fn get_book(&self, book_id: BookId) -> Result<Book>;

    /// 書籍の一覧を取得する
    async fn list_books(&self) -> Result<Vec<Book>>;

    /// 貸出を作成する
    ///
    /// 同一書籍の直列化境界の内側で次をまとめて実行する：
    /// 1. 同一(利用者, 書籍)の貸出中レコードがないこと（DuplicateActiveLoan）
    /// 2. 在庫の1部確保（OutOfStock）
    /// 3. 貸出レコードの挿入
    ///
    /// 途中で失敗した場合は一切の変更を残さない。
    async fn create_loan(&self, loan: &Loan) -> Result<()>;

    /// 貸出を返却する
    ///
    /// 直列化境界の内側で保存ステータスを再検査し（AlreadyReturned）、
    /// 返却記録と在庫の1部返還をまとめて実行する。
    /// 返却後の貸出レコードを返す。
    async fn close_loan(&self, loan_id: LoanId, returned_at: DateTime<Utc>) -> Result<Loan>;

    /// 貸出を取得する
    async fn get_loan(&self, loan_id: LoanId) -> Result<Loan>;

    /// 可視範囲内の貸出一覧を取得する（貸出日の降順）
    async fn list_loans(&self, scope: &LoanScope) -> Result<Vec<Loan>>;

    /// 総部数を変更する
    ///
    /// 直列化境界の内側で貸出中件数を検査し（BelowActiveLoans）、
    /// 貸出可能部数を再計算する。変更後の書籍を返す。
    async fn resize_book(&self, book_id: BookId, new_total: CopyCount) -> Result<Book>;

    /// 書籍を削除する
    ///
    /// 直列化境界の内側で貸出中件数ゼロを検査する（HasActiveLoans）。
    /// 貸出履歴（返却済みレコード）は削除されず残る。
    async fn delete_book(&self, book_id: BookId) -> Result<()>;
}
