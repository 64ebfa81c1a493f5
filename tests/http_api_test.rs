use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use library_ledger::adapters::memory::{MemoryCatalogService, MemoryLedgerStore};
use library_ledger::api::handlers::AppState;
use library_ledger::api::router::create_router;
use library_ledger::api::types::*;
use library_ledger::application::ledger::ServiceDependencies;
use library_ledger::domain::value_objects::*;
use library_ledger::domain::{AccessPolicy, Actor, Role};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// HTTPテスト用のヘルパー関数
// ============================================================================

/// インメモリ実装でアプリケーションを組み立てる
///
/// テストごとに独立した状態を持つ。カタログへの著者・カテゴリの
/// 登録のために具象型も返す。
fn setup_app() -> (Router, Arc<MemoryCatalogService>) {
    let catalog_service = Arc::new(MemoryCatalogService::new());
    let service_deps = ServiceDependencies {
        ledger_store: Arc::new(MemoryLedgerStore::new()),
        catalog_service: catalog_service.clone(),
        access_policy: Arc::new(AccessPolicy::standard()),
    };
    let app_state = Arc::new(AppState { service_deps });

    (create_router(app_state), catalog_service)
}

fn reader() -> Actor {
    Actor::new(UserId::new(), Role::Reader)
}

fn librarian() -> Actor {
    Actor::new(UserId::new(), Role::Librarian)
}

/// 操作主体ヘッダ付きのリクエストビルダー
fn authed(method: &str, uri: &str, actor: &Actor) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-actor-id", actor.id.value().to_string())
        .header("x-actor-role", actor.role.as_str())
}

/// レスポンスボディをJSONとして読み出す
async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// 10〜20文字の範囲に収まる一意なISBNを生成する
fn unique_isbn() -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("978-{}", &tail[..12])
}

/// 司書として書籍を登録し、book_idを返す
async fn register_book_via_api(
    app: &Router,
    staff: &Actor,
    catalog: &MemoryCatalogService,
    total_copies: i64,
) -> Uuid {
    let author_id = AuthorId::new();
    let category_id = CategoryId::new();
    catalog.add_author(author_id);
    catalog.add_category(category_id);

    let request = json!({
        "title": "リーダブルコード",
        "isbn": unique_isbn(),
        "author_id": author_id.value(),
        "category_id": category_id.value(),
        "total_copies": total_copies,
    });

    let response = app
        .clone()
        .oneshot(
            authed("POST", "/books", staff)
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let book: BookResponse = read_json(response).await;
    book.book_id
}

/// 指定の利用者として書籍を借り、loan_idを返す
async fn borrow_via_api(app: &Router, holder: &Actor, book_id: Uuid) -> Uuid {
    let request = json!({ "book_id": book_id });

    let response = app
        .clone()
        .oneshot(
            authed("POST", "/loans", holder)
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: LoanResponse = read_json(response).await;
    created.loan_id
}

// ============================================================================
// 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _catalog) = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_full_loan_flow() {
    // Arrange: 書籍の登録と利用者の準備
    let (app, catalog) = setup_app();
    let staff = librarian();
    let holder = reader();
    let book_id = register_book_via_api(&app, &staff, &catalog, 2).await;

    // Step 1: 貸出作成（POST /loans）
    let loan_request = json!({
        "book_id": book_id,
        "duration_days": 30,
    });

    let response = app
        .clone()
        .oneshot(
            authed("POST", "/loans", &holder)
                .header("content-type", "application/json")
                .body(Body::from(loan_request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let created: LoanResponse = read_json(response).await;
    assert_eq!(created.book_id, book_id);
    assert_eq!(created.holder_id, holder.id.value());
    assert_eq!(created.status, "active");
    assert_eq!(created.returned_at, None);

    // Step 2: 貸出詳細取得（GET /loans/:id）
    let response = app
        .clone()
        .oneshot(
            authed("GET", &format!("/loans/{}", created.loan_id), &holder)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched: LoanResponse = read_json(response).await;
    assert_eq!(fetched.loan_id, created.loan_id);
    assert_eq!(fetched.due_date, created.due_date);

    // Step 3: 在庫が1部減っていることを確認（GET /books/:id）
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/books/{}", book_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let book: BookResponse = read_json(response).await;
    assert_eq!(book.total_copies, 2);
    assert_eq!(book.available_copies, 1);

    // Step 4: 返却（POST /loans/:id/return）
    let response = app
        .clone()
        .oneshot(
            authed("POST", &format!("/loans/{}/return", created.loan_id), &holder)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let returned: LoanResponse = read_json(response).await;
    assert_eq!(returned.status, "returned");
    assert!(returned.returned_at.is_some());

    // Step 5: 在庫が戻っていることを確認
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/books/{}", book_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let book: BookResponse = read_json(response).await;
    assert_eq!(book.available_copies, 2);

    // Step 6: 二重返却は409
    let response = app
        .clone()
        .oneshot(
            authed("POST", &format!("/loans/{}/return", created.loan_id), &holder)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "ALREADY_RETURNED");
}

// ============================================================================
// 認証・認可
// ============================================================================

#[tokio::test]
async fn test_missing_actor_headers_are_unauthorized() {
    let (app, _catalog) = setup_app();

    // ヘッダなしの貸出作成は401
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/loans")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "book_id": Uuid::new_v4() }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // ヘッダなしの貸出一覧も401
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/loans")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 不正な役割は401
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/loans")
                .header("x-actor-id", Uuid::new_v4().to_string())
                .header("x-actor-role", "staff")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 書籍一覧は公開エンドポイントなのでヘッダなしでも200
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/books")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_book_forbidden_for_reader() {
    // Arrange
    let (app, catalog) = setup_app();
    let author_id = AuthorId::new();
    let category_id = CategoryId::new();
    catalog.add_author(author_id);
    catalog.add_category(category_id);

    // Act: 一般利用者による書籍登録
    let request = json!({
        "title": "失敗から学ぶRDBの正しい歩き方",
        "isbn": unique_isbn(),
        "author_id": author_id.value(),
        "category_id": category_id.value(),
        "total_copies": 1,
    });

    let response = app
        .oneshot(
            authed("POST", "/books", &reader())
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "FORBIDDEN");
}

#[tokio::test]
async fn test_reader_cannot_touch_foreign_loan() {
    // Arrange: 利用者Aの貸出
    let (app, catalog) = setup_app();
    let staff = librarian();
    let holder = reader();
    let other = reader();
    let book_id = register_book_via_api(&app, &staff, &catalog, 2).await;
    let loan_id = borrow_via_api(&app, &holder, book_id).await;

    // Act & Assert: 他の利用者による返却は403
    let response = app
        .clone()
        .oneshot(
            authed("POST", &format!("/loans/{}/return", loan_id), &other)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 他の利用者からは貸出の存在自体が見えない（404）
    let response = app
        .clone()
        .oneshot(
            authed("GET", &format!("/loans/{}", loan_id), &other)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // 司書による返却は許可される
    let response = app
        .clone()
        .oneshot(
            authed("POST", &format!("/loans/{}/return", loan_id), &staff)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_loans_scoped_by_role() {
    // Arrange: 2人の利用者がそれぞれ1件ずつ借りている
    let (app, catalog) = setup_app();
    let staff = librarian();
    let first = reader();
    let second = reader();
    let book_id = register_book_via_api(&app, &staff, &catalog, 3).await;
    borrow_via_api(&app, &first, book_id).await;
    borrow_via_api(&app, &second, book_id).await;

    // Act & Assert: 一般利用者は自分の貸出のみ
    let response = app
        .clone()
        .oneshot(authed("GET", "/loans", &first).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let own: Vec<LoanResponse> = read_json(response).await;
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].holder_id, first.id.value());

    // 司書は全件
    let response = app
        .clone()
        .oneshot(authed("GET", "/loans", &staff).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let all: Vec<LoanResponse> = read_json(response).await;
    assert_eq!(all.len(), 2);
}

// ============================================================================
// エラーマッピング
// ============================================================================

#[tokio::test]
async fn test_borrow_unknown_book_returns_404() {
    let (app, _catalog) = setup_app();

    let response = app
        .oneshot(
            authed("POST", "/loans", &reader())
                .header("content-type", "application/json")
                .body(Body::from(json!({ "book_id": Uuid::new_v4() }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_NOT_FOUND");
}

#[tokio::test]
async fn test_borrow_invalid_duration_returns_400() {
    // Arrange
    let (app, catalog) = setup_app();
    let staff = librarian();
    let book_id = register_book_via_api(&app, &staff, &catalog, 1).await;

    // Act: 範囲外の貸出期間
    let request = json!({
        "book_id": book_id,
        "duration_days": 0,
    });

    let response = app
        .oneshot(
            authed("POST", "/loans", &reader())
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "INVALID_DURATION");
}

#[tokio::test]
async fn test_borrow_out_of_stock_returns_409() {
    // Arrange: 在庫1部を先に貸し出す
    let (app, catalog) = setup_app();
    let staff = librarian();
    let book_id = register_book_via_api(&app, &staff, &catalog, 1).await;
    borrow_via_api(&app, &reader(), book_id).await;

    // Act: 在庫0での貸出
    let response = app
        .oneshot(
            authed("POST", "/loans", &reader())
                .header("content-type", "application/json")
                .body(Body::from(json!({ "book_id": book_id }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "OUT_OF_STOCK");
}

#[tokio::test]
async fn test_register_duplicate_isbn_returns_409() {
    // Arrange
    let (app, catalog) = setup_app();
    let staff = librarian();
    let author_id = AuthorId::new();
    let category_id = CategoryId::new();
    catalog.add_author(author_id);
    catalog.add_category(category_id);

    let isbn = unique_isbn();
    let request = json!({
        "title": "データ指向アプリケーションデザイン",
        "isbn": isbn,
        "author_id": author_id.value(),
        "category_id": category_id.value(),
        "total_copies": 2,
    });

    let response = app
        .clone()
        .oneshot(
            authed("POST", "/books", &staff)
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Act: 同じISBNで再登録
    let response = app
        .oneshot(
            authed("POST", "/books", &staff)
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "DUPLICATE_ISBN");
}

#[tokio::test]
async fn test_register_unknown_author_returns_422() {
    // Arrange: 著者をカタログに登録しない
    let (app, catalog) = setup_app();
    let category_id = CategoryId::new();
    catalog.add_category(category_id);

    let request = json!({
        "title": "分散システムデザインパターン",
        "isbn": unique_isbn(),
        "author_id": Uuid::new_v4(),
        "category_id": category_id.value(),
        "total_copies": 1,
    });

    // Act
    let response = app
        .oneshot(
            authed("POST", "/books", &librarian())
                .header("content-type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "AUTHOR_NOT_FOUND");
}

// ============================================================================
// 在庫変更と削除
// ============================================================================

#[tokio::test]
async fn test_resize_below_active_loans_returns_409() {
    // Arrange: 総部数3、うち2部貸出中
    let (app, catalog) = setup_app();
    let staff = librarian();
    let book_id = register_book_via_api(&app, &staff, &catalog, 3).await;
    borrow_via_api(&app, &reader(), book_id).await;
    borrow_via_api(&app, &reader(), book_id).await;

    // Act: 貸出中件数を下回る縮小
    let response = app
        .clone()
        .oneshot(
            authed("PUT", &format!("/books/{}/copies", book_id), &staff)
                .header("content-type", "application/json")
                .body(Body::from(json!({ "total_copies": 1 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BELOW_ACTIVE_LOANS");

    // 貸出中件数ちょうどへの縮小は許可され、貸出可能は0になる
    let response = app
        .oneshot(
            authed("PUT", &format!("/books/{}/copies", book_id), &staff)
                .header("content-type", "application/json")
                .body(Body::from(json!({ "total_copies": 2 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let book: BookResponse = read_json(response).await;
    assert_eq!(book.total_copies, 2);
    assert_eq!(book.available_copies, 0);
}

#[tokio::test]
async fn test_delete_book_flow() {
    // Arrange: 貸出中の貸出が1件ある書籍
    let (app, catalog) = setup_app();
    let staff = librarian();
    let holder = reader();
    let book_id = register_book_via_api(&app, &staff, &catalog, 1).await;
    let loan_id = borrow_via_api(&app, &holder, book_id).await;

    // Act & Assert: 貸出中は削除できない（409）
    let response = app
        .clone()
        .oneshot(
            authed("DELETE", &format!("/books/{}", book_id), &staff)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_HAS_ACTIVE_LOANS");

    // 返却して再度削除（204）
    let response = app
        .clone()
        .oneshot(
            authed("POST", &format!("/loans/{}/return", loan_id), &holder)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            authed("DELETE", &format!("/books/{}", book_id), &staff)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // 削除後の書籍取得は404
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/books/{}", book_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // 削除後も貸出履歴は参照できる
    let response = app
        .clone()
        .oneshot(
            authed("GET", &format!("/loans/{}", loan_id), &holder)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history: LoanResponse = read_json(response).await;
    assert_eq!(history.status, "returned");
}

#[tokio::test]
async fn test_list_books_available_only_query() {
    // Arrange: 在庫が尽きた書籍と在庫の残る書籍
    let (app, catalog) = setup_app();
    let staff = librarian();
    let exhausted = register_book_via_api(&app, &staff, &catalog, 1).await;
    let in_stock = register_book_via_api(&app, &staff, &catalog, 2).await;
    borrow_via_api(&app, &reader(), exhausted).await;

    // Act: 貸出可能のみの一覧
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/books?available_only=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let books: Vec<BookResponse> = read_json(response).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].book_id, in_stock);

    // フィルタなしは全件
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/books")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let books: Vec<BookResponse> = read_json(response).await;
    assert_eq!(books.len(), 2);
}
