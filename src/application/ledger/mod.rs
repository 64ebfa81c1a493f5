/// 貸出台帳のアプリケーションサービス
///
/// ユースケースごとの薄い調停層。入力のバリデーションと認可を行い、
/// ビジネスルールの判定はDomain層の純粋関数へ、原子的な状態遷移は
/// Ports層のストアへ委譲する。
pub mod book_service;
pub mod dependencies;
pub mod errors;
pub mod loan_service;

pub use book_service::*;
pub use dependencies::ServiceDependencies;
pub use errors::{LedgerError, Result};
pub use loan_service::*;
