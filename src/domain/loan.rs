use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, CloseLoanError, LoanId, LoanPeriod, UserId};

/// 永続化される貸出ステータス
///
/// 保存されるのはActiveとReturnedの2状態のみ。
/// 「延滞」は保存されず、読み取り時に返却期限と現在時刻から導出される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredStatus {
    /// 貸出中
    Active,
    /// 返却済み
    Returned,
}

impl StoredStatus {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            StoredStatus::Active => "active",
            StoredStatus::Returned => "returned",
        }
    }
}

impl std::str::FromStr for StoredStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(StoredStatus::Active),
            "returned" => Ok(StoredStatus::Returned),
            _ => Err(format!("Invalid stored status: {}", s)),
        }
    }
}

/// 実効ステータス（読み取り時に導出）
///
/// Overdueは(stored_status, due_date, now)の純粋関数としてのみ存在し、
/// どの読み取り経路でも書き戻されることはない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 貸出中（期限内）
    Active,
    /// 延滞中（期限超過かつ未返却）
    Overdue,
    /// 返却済み
    Returned,
}

impl LoanStatus {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 貸出レコードは削除されず、Active→Returnedへ一度だけ遷移する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub holder_id: UserId,

    // 貸出管理の責務
    pub loaned_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: StoredStatus,
}

/// 純粋関数：貸出を開始する
///
/// ビジネスルール：
/// - 返却期限は貸出日 + 貸出期間（期間はLoanPeriodが1〜90日を保証）
/// - 状態はActive、returned_atは未設定
///
/// 在庫確保との原子性はストアのトランザクション境界が担う。
/// 副作用なし。新しいLoanを返す。
pub fn open_loan(
    book_id: BookId,
    holder_id: UserId,
    loaned_at: DateTime<Utc>,
    period: LoanPeriod,
) -> Loan {
    Loan {
        loan_id: LoanId::new(),
        book_id,
        holder_id,
        loaned_at,
        due_date: loaned_at + period.duration(),
        returned_at: None,
        status: StoredStatus::Active,
    }
}

/// 純粋関数：貸出を返却する
///
/// ビジネスルール：
/// - 既に返却済みの貸出は再返却できない（返却は一度きり）
/// - 延滞していても返却は受け付ける
///
/// 副作用なし。新しいLoanを返す。
pub fn close_loan(loan: &Loan, returned_at: DateTime<Utc>) -> Result<Loan, CloseLoanError> {
    // バリデーション：既に返却済みは不可
    if loan.status == StoredStatus::Returned {
        return Err(CloseLoanError::AlreadyReturned);
    }

    Ok(Loan {
        returned_at: Some(returned_at),
        status: StoredStatus::Returned,
        ..loan.clone()
    })
}

/// 純粋関数：実効ステータスの導出
///
/// ビジネスルール：
/// - 返却済みならReturned（期限超過後に返却されていてもReturned）
/// - 未返却かつ now > due_date ならOverdue
/// - それ以外はActive
///
/// 導出結果は保存されない。
pub fn effective_status(loan: &Loan, now: DateTime<Utc>) -> LoanStatus {
    match loan.status {
        StoredStatus::Returned => LoanStatus::Returned,
        StoredStatus::Active if now > loan.due_date => LoanStatus::Overdue,
        StoredStatus::Active => LoanStatus::Active,
    }
}

/// 純粋関数：延滞判定
pub fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    effective_status(loan, now) == LoanStatus::Overdue
}
