use crate::application::ledger::{
    ServiceDependencies, borrow_book as execute_borrow_book, delete_book as execute_delete_book,
    get_book as execute_get_book, get_loan as execute_get_loan, list_books as execute_list_books,
    list_loans as execute_list_loans, register_book as execute_register_book,
    resize_book as execute_resize_book, return_loan as execute_return_loan,
};
use crate::domain::Actor;
use crate::domain::value_objects::{BookId, LoanId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BookResponse, BorrowBookRequest, ListBooksQuery, LoanResponse, RegisterBookRequest,
        ResizeBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Loan handlers
// ============================================================================

/// POST /loans - 新しい貸出を作成
///
/// 操作主体自身を借り手として貸出を作成する。
///
/// 強制されるビジネスルール:
/// - 貸出期間は1〜90日（省略時は14日）
/// - 書籍に貸出可能な部数が残っていること
/// - 同一利用者が同一書籍を二重に借りないこと
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(req): Json<BorrowBookRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let now = chrono::Utc::now();
    let cmd = req.to_command(now);

    let created = execute_borrow_book(&state.service_deps, &actor, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse::from_loan(&created, now)),
    ))
}

/// POST /loans/:id/return - 貸出を返却
///
/// 強制されるビジネスルール:
/// - 借り手本人または司書以上のみが返却できる
/// - 既に返却済みでないこと
/// - 延滞中の貸出も返却可能
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(loan_id): Path<Uuid>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let loan_id = LoanId::from_uuid(loan_id);
    let now = chrono::Utc::now();

    let cmd = crate::domain::commands::ReturnLoan {
        loan_id,
        returned_at: now,
    };

    let returned = execute_return_loan(&state.service_deps, &actor, cmd).await?;

    Ok((
        StatusCode::OK,
        Json(LoanResponse::from_loan(&returned, now)),
    ))
}

/// GET /loans - 貸出一覧取得
///
/// 一般利用者は自分の貸出のみ、司書以上は全件を取得する。
/// ステータスは読み取り時点で導出され、結果は貸出日の降順。
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = execute_list_loans(&state.service_deps, &actor).await?;

    let now = chrono::Utc::now();
    let responses = loans
        .iter()
        .map(|entry| LoanResponse::from_loan(entry, now))
        .collect();

    Ok(Json(responses))
}

/// GET /loans/:id - 貸出詳細をIDで取得
///
/// 一般利用者が他人の貸出を指定した場合は404を返す（存在を伏せる）。
pub async fn get_loan_by_id(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan_id = LoanId::from_uuid(loan_id);

    let entry = execute_get_loan(&state.service_deps, &actor, loan_id).await?;

    Ok(Json(LoanResponse::from_loan(&entry, chrono::Utc::now())))
}

// ============================================================================
// Book handlers
// ============================================================================

/// POST /books - 書籍を登録
///
/// 強制されるビジネスルール:
/// - 司書以上のみが登録できる
/// - ISBNは10〜20文字かつ蔵書内で一意
/// - 総部数は1〜1000部で、登録直後は全部数が貸出可能
/// - 著者とカテゴリはカタログに存在すること
pub async fn register_book(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(req): Json<RegisterBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let cmd = req.to_command();

    let book = execute_register_book(&state.service_deps, &actor, cmd).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /books - 書籍一覧取得
///
/// クエリパラメータ:
/// - available_only: 貸出可能な部数が残る書籍のみに絞る（オプション）
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books =
        execute_list_books(&state.service_deps, query.available_only.unwrap_or(false)).await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/:id - 書籍詳細をIDで取得
pub async fn get_book_by_id(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = execute_get_book(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(Json(BookResponse::from(book)))
}

/// PUT /books/:id/copies - 総部数を変更
///
/// 強制されるビジネスルール:
/// - 司書以上のみが変更できる
/// - 貸出中の件数を下回る縮小は拒否する
pub async fn resize_book(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ResizeBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let cmd = crate::domain::commands::ResizeBook {
        book_id: BookId::from_uuid(book_id),
        total_copies: req.total_copies,
    };

    let book = execute_resize_book(&state.service_deps, &actor, cmd).await?;

    Ok((StatusCode::OK, Json(BookResponse::from(book))))
}

/// DELETE /books/:id - 書籍を削除
///
/// 強制されるビジネスルール:
/// - 司書以上のみが削除できる
/// - 貸出中の貸出が残っている書籍は削除できない
/// - 過去の貸出履歴は削除後も参照できる
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let book_id = BookId::from_uuid(book_id);

    execute_delete_book(&state.service_deps, &actor, book_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
