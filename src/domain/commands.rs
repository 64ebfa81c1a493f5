use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthorId, BookId, CategoryId, LoanId};

/// コマンド：書籍を借りる
///
/// 借り手は常に操作主体自身。期間未指定時は標準の14日を適用する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: BookId,
    pub duration_days: Option<i64>,
    pub loaned_at: DateTime<Utc>,
}

/// コマンド：貸出を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBook {
    pub title: String,
    pub isbn: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub total_copies: i64,
}

/// コマンド：総部数を変更する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeBook {
    pub book_id: BookId,
    pub total_copies: i64,
}
