use crate::application::ledger::dependencies::ServiceDependencies;
use crate::application::ledger::errors::{LedgerError, Result};
use crate::domain::commands::{BorrowBook, ReturnLoan};
use crate::domain::loan::{open_loan, Loan};
use crate::domain::{Actor, LoanId, LoanPeriod};

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出期間は1〜90日（省略時は14日）
/// - 在庫が残っていること（在庫の確保は書籍単位で直列化される）
/// - 同一利用者が同一書籍を二重に借りられない
pub async fn borrow_book(
    deps: &ServiceDependencies,
    actor: &Actor,
    command: BorrowBook,
) -> Result<Loan> {
    // 1. 貸出期間のバリデーション
    let period = match command.duration_days {
        Some(days) => {
            LoanPeriod::try_from(days).map_err(|_| LedgerError::InvalidDuration(days))?
        }
        None => LoanPeriod::default(),
    };

    // 2. 貸出レコードの生成（純粋関数）
    let loan = open_loan(command.book_id, actor.id, command.loaned_at, period);

    // 3. 在庫の確保と貸出の記録（ストアが原子的に実行する）
    deps.ledger_store.create_loan(&loan).await?;

    Ok(loan)
}

/// 貸出を返却する
///
/// ビジネスルール：
/// - 本人または司書以上のみが返却できる
/// - 返却済みの貸出は再返却できない
/// - 返却の記録と在庫の解放は原子的に行う
pub async fn return_loan(
    deps: &ServiceDependencies,
    actor: &Actor,
    command: ReturnLoan,
) -> Result<Loan> {
    // 1. 対象貸出の取得
    let loan = deps.ledger_store.get_loan(command.loan_id).await?;

    // 2. 認可：本人または司書以上か
    if !deps.access_policy.may_return(actor, &loan) {
        return Err(LedgerError::Forbidden);
    }

    // 3. 返却の記録と在庫の解放（ストアが原子的に実行する）
    let returned = deps
        .ledger_store
        .close_loan(command.loan_id, command.returned_at)
        .await?;

    Ok(returned)
}

/// 貸出の一覧を取得する
///
/// 利用者は自分の貸出のみ、司書以上は全件を参照できる。
/// 結果は貸出日の降順。
pub async fn list_loans(deps: &ServiceDependencies, actor: &Actor) -> Result<Vec<Loan>> {
    // 1. 役割から参照範囲を決める
    let scope = deps.access_policy.loan_scope(actor);

    // 2. 範囲内の貸出を取得
    let loans = deps.ledger_store.list_loans(&scope).await?;

    Ok(loans)
}

/// 貸出を1件取得する
///
/// 参照権限のない貸出は、存在を伏せるため NotFound として扱う。
pub async fn get_loan(deps: &ServiceDependencies, actor: &Actor, loan_id: LoanId) -> Result<Loan> {
    // 1. 貸出の取得
    let loan = deps.ledger_store.get_loan(loan_id).await?;

    // 2. 参照権限の確認
    if !deps.access_policy.may_view(actor, &loan) {
        return Err(LedgerError::LoanNotFound);
    }

    Ok(loan)
}
