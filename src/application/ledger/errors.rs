use thiserror::Error;

use crate::ports::StoreError;

/// 貸出台帳アプリケーション層のエラー
///
/// バリデーション・不在・競合・認可・インフラ障害を1つの型に平坦化し、
/// API層でのHTTPステータスへの対応付けを単純にする。
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 貸出期間が範囲外（1〜90日）
    #[error("Loan duration out of range: {0} days")]
    InvalidDuration(i64),

    /// 総部数が範囲外（1〜1000部）
    #[error("Total copies out of range: {0}")]
    InvalidCopyCount(i64),

    /// ISBNが不正（10〜20文字）
    #[error("ISBN must be 10 to 20 characters")]
    InvalidIsbn,

    /// タイトルが空
    #[error("Title must not be empty")]
    InvalidTitle,

    /// 書籍が見つからない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 著者が見つからない
    #[error("Author not found")]
    AuthorNotFound,

    /// カテゴリが見つからない
    #[error("Category not found")]
    CategoryNotFound,

    /// 貸出可能な部数が残っていない
    #[error("No copies available for loan")]
    OutOfStock,

    /// 同一利用者が同一書籍を貸出中
    #[error("Holder already has an active loan for this book")]
    DuplicateActiveLoan,

    /// 既に返却済み
    #[error("Loan is already returned")]
    AlreadyReturned,

    /// 貸出中の件数を下回る縮小
    #[error("Cannot shrink total copies below active loans ({active} active)")]
    BelowActiveLoans { active: u32 },

    /// 貸出中の貸出が残っている書籍の削除
    #[error("Book still has active loans ({active} active)")]
    BookHasActiveLoans { active: u32 },

    /// ISBNが既に登録済み
    #[error("ISBN already registered")]
    DuplicateIsbn,

    /// 役割が不足している
    #[error("Operation not permitted for this role")]
    Forbidden,

    /// ストアのエラー
    #[error("Ledger store error")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// ストアの型付きエラーをアプリケーション層のエラーに平坦化する
impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookNotFound => LedgerError::BookNotFound,
            StoreError::LoanNotFound => LedgerError::LoanNotFound,
            StoreError::DuplicateIsbn => LedgerError::DuplicateIsbn,
            StoreError::DuplicateActiveLoan => LedgerError::DuplicateActiveLoan,
            StoreError::OutOfStock => LedgerError::OutOfStock,
            StoreError::AlreadyReturned => LedgerError::AlreadyReturned,
            StoreError::BelowActiveLoans { active } => LedgerError::BelowActiveLoans { active },
            StoreError::HasActiveLoans { active } => LedgerError::BookHasActiveLoans { active },
            StoreError::Backend(source) => LedgerError::Store(source),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LedgerError>;
