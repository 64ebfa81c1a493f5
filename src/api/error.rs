use crate::application::ledger::LedgerError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 400 Bad Request - 入力バリデーション違反
            LedgerError::InvalidDuration(days) => (
                StatusCode::BAD_REQUEST,
                "INVALID_DURATION",
                format!("Loan duration must be between 1 and 90 days, got {}", days),
            ),
            LedgerError::InvalidCopyCount(count) => (
                StatusCode::BAD_REQUEST,
                "INVALID_COPY_COUNT",
                format!("Total copies must be between 1 and 1000, got {}", count),
            ),
            LedgerError::InvalidIsbn => (
                StatusCode::BAD_REQUEST,
                "INVALID_ISBN",
                "ISBN must be 10 to 20 characters".to_string(),
            ),
            LedgerError::InvalidTitle => (
                StatusCode::BAD_REQUEST,
                "INVALID_TITLE",
                "Title must not be empty".to_string(),
            ),

            // 404 Not Found - リクエストされたリソースが存在しない
            LedgerError::BookNotFound => (
                StatusCode::NOT_FOUND,
                "BOOK_NOT_FOUND",
                "Book not found".to_string(),
            ),
            LedgerError::LoanNotFound => (
                StatusCode::NOT_FOUND,
                "LOAN_NOT_FOUND",
                "Loan not found".to_string(),
            ),

            // 422 Unprocessable Entity - 参照先のカタログ項目が存在しない
            LedgerError::AuthorNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "AUTHOR_NOT_FOUND",
                "Author not found".to_string(),
            ),
            LedgerError::CategoryNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CATEGORY_NOT_FOUND",
                "Category not found".to_string(),
            ),

            // 409 Conflict - 現在の状態と矛盾する操作
            LedgerError::OutOfStock => (
                StatusCode::CONFLICT,
                "OUT_OF_STOCK",
                "No copies available for loan".to_string(),
            ),
            LedgerError::DuplicateActiveLoan => (
                StatusCode::CONFLICT,
                "DUPLICATE_ACTIVE_LOAN",
                "Holder already has an active loan for this book".to_string(),
            ),
            LedgerError::AlreadyReturned => (
                StatusCode::CONFLICT,
                "ALREADY_RETURNED",
                "Loan is already returned".to_string(),
            ),
            LedgerError::BelowActiveLoans { active } => (
                StatusCode::CONFLICT,
                "BELOW_ACTIVE_LOANS",
                format!(
                    "Cannot shrink total copies below active loans ({} active)",
                    active
                ),
            ),
            LedgerError::BookHasActiveLoans { active } => (
                StatusCode::CONFLICT,
                "BOOK_HAS_ACTIVE_LOANS",
                format!("Book still has active loans ({} active)", active),
            ),
            LedgerError::DuplicateIsbn => (
                StatusCode::CONFLICT,
                "DUPLICATE_ISBN",
                "ISBN already registered".to_string(),
            ),

            // 403 Forbidden - 役割が不足している
            LedgerError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Operation not permitted for this role".to_string(),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LedgerError::Store(ref e) => {
                tracing::error!("Ledger store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
