use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 貸出ID - 貸出台帳の集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

/// 書籍ID - 在庫管理対象の書籍レコードへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者ID - 外部の認証基盤が発行する利用者への参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 著者ID - 外部カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(Uuid);

impl AuthorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for AuthorId {
    fn default() -> Self {
        Self::new()
    }
}

/// カテゴリID - 外部カタログコンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

/// 貸出期間エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanPeriodError {
    /// 1〜90日の範囲外
    OutOfRange,
}

/// 貸出期間（日数）
///
/// 不変条件：1日以上90日以下。指定がない場合は14日。
/// 型システムでこの制約を強制し、不正な期間（0日や91日以上）を
/// 作成できないようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPeriod(i64);

impl LoanPeriod {
    /// 最短貸出期間（日）
    pub const MIN_DAYS: i64 = 1;
    /// 最長貸出期間（日）
    pub const MAX_DAYS: i64 = 90;
    /// 期間未指定時の標準貸出期間（日）
    pub const DEFAULT_DAYS: i64 = 14;

    /// 日数
    pub fn days(&self) -> i64 {
        self.0
    }

    /// chronoのDurationに変換する
    pub fn duration(&self) -> Duration {
        Duration::days(self.0)
    }
}

impl Default for LoanPeriod {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

impl TryFrom<i64> for LoanPeriod {
    type Error = LoanPeriodError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        if !(Self::MIN_DAYS..=Self::MAX_DAYS).contains(&days) {
            return Err(LoanPeriodError::OutOfRange);
        }
        Ok(Self(days))
    }
}

/// 総部数エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyCountError {
    /// 1〜1000部の範囲外
    OutOfRange,
}

/// 書籍の総部数
///
/// 不変条件：1部以上1000部以下。
/// 0部の書籍や非現実的な部数を型レベルで排除する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyCount(u32);

impl CopyCount {
    /// 最小部数
    pub const MIN: u32 = 1;
    /// 最大部数
    pub const MAX: u32 = 1000;

    /// 現在の部数
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for CopyCount {
    type Error = CopyCountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            return Err(CopyCountError::OutOfRange);
        }
        Ok(Self(value as u32))
    }
}

/// ISBNエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsbnError {
    /// 10〜20文字の範囲外
    InvalidLength,
}

/// ISBN
///
/// 不変条件：10文字以上20文字以下（ハイフン付き13桁表記を許容）。
/// 一意性は台帳ストアが保存時に検査する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Isbn(String);

impl Isbn {
    pub fn new(value: impl Into<String>) -> Result<Self, IsbnError> {
        let value = value.into();
        if !(10..=20).contains(&value.chars().count()) {
            return Err(IsbnError::InvalidLength);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}
