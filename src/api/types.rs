use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::book::Book;
use crate::domain::commands::{BorrowBook, RegisterBook};
use crate::domain::loan::{self, Loan};
use crate::domain::{AuthorId, BookId, CategoryId};

/// 貸出作成リクエスト（POST /loans）
#[derive(Debug, Deserialize)]
pub struct BorrowBookRequest {
    pub book_id: Uuid,
    /// 貸出期間（日数、1〜90）。省略時は14日
    pub duration_days: Option<i64>,
}

impl BorrowBookRequest {
    /// 貸出コマンドに変換する（貸出日時はリクエスト処理時刻）
    pub fn to_command(&self, loaned_at: DateTime<Utc>) -> BorrowBook {
        BorrowBook {
            book_id: BookId::from_uuid(self.book_id),
            duration_days: self.duration_days,
            loaned_at,
        }
    }
}

/// 書籍登録リクエスト（POST /books）
#[derive(Debug, Deserialize)]
pub struct RegisterBookRequest {
    pub title: String,
    pub isbn: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub total_copies: i64,
}

impl RegisterBookRequest {
    /// 書籍登録コマンドに変換する
    pub fn to_command(&self) -> RegisterBook {
        RegisterBook {
            title: self.title.clone(),
            isbn: self.isbn.clone(),
            author_id: AuthorId::from_uuid(self.author_id),
            category_id: CategoryId::from_uuid(self.category_id),
            total_copies: self.total_copies,
        }
    }
}

/// 総部数変更リクエスト（PUT /books/:id/copies）
#[derive(Debug, Deserialize)]
pub struct ResizeBookRequest {
    pub total_copies: i64,
}

/// 書籍一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// 貸出可能な部数が残る書籍のみに絞る
    pub available_only: Option<bool>,
}

/// 貸出レスポンス
///
/// statusは読み取り時点で導出した実効ステータス
/// （active / overdue / returned）。保存された状態そのものではない。
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub holder_id: Uuid,
    pub loaned_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: String,
}

impl LoanResponse {
    /// 読み取り時点の実効ステータスを導出して変換する
    pub fn from_loan(entry: &Loan, now: DateTime<Utc>) -> Self {
        Self {
            loan_id: entry.loan_id.value(),
            book_id: entry.book_id.value(),
            holder_id: entry.holder_id.value(),
            loaned_at: entry.loaned_at,
            due_date: entry.due_date,
            returned_at: entry.returned_at,
            status: loan::effective_status(entry, now).as_str().to_string(),
        }
    }
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub book_id: Uuid,
    pub title: String,
    pub isbn: String,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.book_id.value(),
            title: book.title,
            isbn: book.isbn.value().to_string(),
            author_id: book.author_id.value(),
            category_id: book.category_id.value(),
            total_copies: book.total_copies.value(),
            available_copies: book.available_copies,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
