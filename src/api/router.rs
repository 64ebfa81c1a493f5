use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_loan, delete_book, get_book_by_id, get_loan_by_id, list_books, list_loans,
    register_book, resize_book, return_loan,
};

/// Creates the API router with all ledger and inventory endpoints
///
/// Loan endpoints:
/// - POST /loans - Borrow a book (the actor becomes the holder)
/// - GET /loans - List loans visible to the actor
/// - GET /loans/:id - Get loan details
/// - POST /loans/:id/return - Return a loan
///
/// Book endpoints:
/// - POST /books - Register a book (librarian and above)
/// - GET /books - List books
/// - GET /books/:id - Get book details
/// - PUT /books/:id/copies - Change total copies (librarian and above)
/// - DELETE /books/:id - Delete a book (librarian and above)
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Loan endpoints
        .route("/loans", post(create_loan).get(list_loans))
        .route("/loans/:id", get(get_loan_by_id))
        .route("/loans/:id/return", post(return_loan))
        // Book endpoints
        .route("/books", post(register_book).get(list_books))
        .route("/books/:id", get(get_book_by_id).delete(delete_book))
        .route("/books/:id/copies", put(resize_book))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
