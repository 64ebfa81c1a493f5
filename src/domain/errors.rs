/// 在庫確保のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveCopyError {
    /// 貸出可能な部数が残っていない
    OutOfStock,
}

/// 総部数変更のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeCopiesError {
    /// 貸出中の件数を下回る部数には縮小できない
    BelowActiveLoans { active: u32 },
}

/// 書籍削除のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteBookError {
    /// 貸出中の貸出が残っている
    HasActiveLoans { active: u32 },
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseLoanError {
    /// 既に返却済み
    AlreadyReturned,
}
