use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{UserId, loan::Loan};

/// 役割
///
/// 外部の認証基盤が検証済みの役割を付与する。本システムは検証せず信頼する。
/// 権限は順序付き（Reader < Librarian < Admin）で、上位役割は下位役割の
/// 操作をすべて行える。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 一般利用者
    Reader,
    /// 司書
    Librarian,
    /// 管理者
    Admin,
}

impl Role {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Librarian => "librarian",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reader" => Ok(Role::Reader),
            "librarian" => Ok(Role::Librarian),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// 操作主体
///
/// 認証済みの(利用者ID, 役割)の組。リクエスト処理中は不変。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// カタログ保守操作
///
/// 役割テーブルで最低役割を設定できる操作の集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogAction {
    /// 書籍の登録
    RegisterBook,
    /// 総部数の変更
    ResizeBook,
    /// 書籍の削除
    DeleteBook,
}

/// 認可判定の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// 貸出読み取りの可視範囲
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanScope {
    /// 本人の貸出のみ
    Own(UserId),
    /// 全件
    All,
}

/// アクセスポリシー
///
/// 純粋な判定テーブル。永続状態を持たず、入出力のみで決まる。
/// カタログ保守操作ごとの最低役割は構成可能で、標準構成では
/// すべて司書以上とする。
///
/// 貸出操作の規則は固定：
/// - 貸出作成は認証済みであれば役割を問わない（借り手は常に本人）
/// - 返却は借り手本人、または司書以上
/// - 貸出の読み取りは一般利用者は本人分のみ、司書以上は全件
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: HashMap<CatalogAction, Role>,
}

impl AccessPolicy {
    /// 標準構成（カタログ保守はすべて司書以上）
    pub fn standard() -> Self {
        let mut rules = HashMap::new();
        rules.insert(CatalogAction::RegisterBook, Role::Librarian);
        rules.insert(CatalogAction::ResizeBook, Role::Librarian);
        rules.insert(CatalogAction::DeleteBook, Role::Librarian);
        Self { rules }
    }

    /// 操作の最低役割を上書きする
    pub fn with_rule(mut self, action: CatalogAction, min_role: Role) -> Self {
        self.rules.insert(action, min_role);
        self
    }

    /// カタログ保守操作の認可判定
    ///
    /// テーブルに登録のない操作は拒否する（fail-closed）。
    pub fn authorize(&self, actor: &Actor, action: CatalogAction) -> Decision {
        match self.rules.get(&action) {
            Some(min_role) if actor.role >= *min_role => Decision::Allow,
            _ => Decision::Deny,
        }
    }

    /// 貸出読み取りの可視範囲を決定する
    pub fn loan_scope(&self, actor: &Actor) -> LoanScope {
        if actor.role >= Role::Librarian {
            LoanScope::All
        } else {
            LoanScope::Own(actor.id)
        }
    }

    /// この貸出を閲覧できるか
    pub fn may_view(&self, actor: &Actor, loan: &Loan) -> bool {
        match self.loan_scope(actor) {
            LoanScope::All => true,
            LoanScope::Own(user_id) => loan.holder_id == user_id,
        }
    }

    /// この貸出を返却できるか（借り手本人または司書以上）
    pub fn may_return(&self, actor: &Actor, loan: &Loan) -> bool {
        actor.id == loan.holder_id || actor.role >= Role::Librarian
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard()
    }
}
