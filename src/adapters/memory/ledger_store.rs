use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::book::Book;
use crate::domain::loan::{self, Loan, StoredStatus};
use crate::domain::{BookId, CopyCount, LoanId, LoanScope};
use crate::ports::ledger_store::{LedgerStore as LedgerStoreTrait, Result, StoreError};

/// 書籍ごとのセルとISBN索引
struct Catalog {
    cells: HashMap<BookId, Arc<AsyncMutex<Book>>>,
    isbn_index: HashSet<String>,
}

/// インメモリ実装：台帳ストア
///
/// 書籍ごとに非同期Mutexのセルを1つ持ち、在庫を変更する操作は対象の
/// セルを獲得してから実行する。同一書籍の変更は直列化され、別書籍の
/// 操作は並行に進む（Postgres実装の行ロックと同じ境界）。
///
/// ロック順序：セル → カタログ／貸出マップ。カタログのガードを保持
/// したままセルを待たない（Arcを複製してからガードを解放する）。
pub struct LedgerStore {
    catalog: RwLock<Catalog>,
    loans: Mutex<HashMap<LoanId, Loan>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog {
                cells: HashMap::new(),
                isbn_index: HashSet::new(),
            }),
            loans: Mutex::new(HashMap::new()),
        }
    }

    /// 対象書籍のセルを取得する
    fn cell(&self, book_id: BookId) -> Result<Arc<AsyncMutex<Book>>> {
        let catalog = self.catalog.read().unwrap();
        catalog
            .cells
            .get(&book_id)
            .cloned()
            .ok_or(StoreError::BookNotFound)
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStoreTrait for LedgerStore {
    /// 書籍を登録する（ISBNの重複は拒否）
    async fn insert_book(&self, book: &Book) -> Result<()> {
        let mut catalog = self.catalog.write().unwrap();

        if catalog.isbn_index.contains(book.isbn.value()) {
            return Err(StoreError::DuplicateIsbn);
        }

        catalog.isbn_index.insert(book.isbn.value().to_string());
        catalog
            .cells
            .insert(book.book_id, Arc::new(AsyncMutex::new(book.clone())));
        Ok(())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book> {
        let cell = self.cell(book_id)?;
        let book = cell.lock().await.clone();
        Ok(book)
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let cells: Vec<_> = {
            let catalog = self.catalog.read().unwrap();
            catalog.cells.values().cloned().collect()
        };

        let mut books = Vec::with_capacity(cells.len());
        for cell in cells {
            books.push(cell.lock().await.clone());
        }
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    /// 貸出を作成する
    ///
    /// 二重貸出の確認・在庫の確保・貸出の記録を、対象書籍のセルを
    /// 保持したまま行う。
    async fn create_loan(&self, new_loan: &Loan) -> Result<()> {
        let cell = self.cell(new_loan.book_id)?;
        let mut book = cell.lock().await;

        // セル獲得までの間に書籍が削除されていないか再確認
        if !self
            .catalog
            .read()
            .unwrap()
            .cells
            .contains_key(&new_loan.book_id)
        {
            return Err(StoreError::BookNotFound);
        }

        let mut loans = self.loans.lock().unwrap();

        // 同一利用者が同一書籍を貸出中なら拒否
        let duplicate = loans.values().any(|existing| {
            existing.holder_id == new_loan.holder_id
                && existing.book_id == new_loan.book_id
                && existing.status == StoredStatus::Active
        });
        if duplicate {
            return Err(StoreError::DuplicateActiveLoan);
        }

        // 在庫の確保と貸出の記録
        let reserved = book.clone().reserve_copy()?;
        *book = reserved;
        loans.insert(new_loan.loan_id, new_loan.clone());

        Ok(())
    }

    /// 返却を記録する
    ///
    /// 返却済みの再確認・返却の記録・在庫の解放を、対象書籍のセルを
    /// 保持したまま行う。
    async fn close_loan(&self, loan_id: LoanId, returned_at: DateTime<Utc>) -> Result<Loan> {
        // スナップショットで対象書籍を特定する
        let snapshot = self
            .loans
            .lock()
            .unwrap()
            .get(&loan_id)
            .cloned()
            .ok_or(StoreError::LoanNotFound)?;
        if snapshot.status == StoredStatus::Returned {
            return Err(StoreError::AlreadyReturned);
        }

        let cell = self.cell(snapshot.book_id)?;
        let mut book = cell.lock().await;
        let mut loans = self.loans.lock().unwrap();

        // セル獲得までの間に先行の返却が完了していないか再確認
        let current = loans
            .get(&loan_id)
            .cloned()
            .ok_or(StoreError::LoanNotFound)?;
        let closed = loan::close_loan(&current, returned_at)?;

        // 返却の記録と在庫の解放
        let released = book.clone().release_copy();
        *book = released;
        loans.insert(loan_id, closed.clone());

        Ok(closed)
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.loans
            .lock()
            .unwrap()
            .get(&loan_id)
            .cloned()
            .ok_or(StoreError::LoanNotFound)
    }

    async fn list_loans(&self, scope: &LoanScope) -> Result<Vec<Loan>> {
        let loans = self.loans.lock().unwrap();
        let mut result: Vec<Loan> = loans
            .values()
            .filter(|entry| match scope {
                LoanScope::All => true,
                LoanScope::Own(holder_id) => entry.holder_id == *holder_id,
            })
            .cloned()
            .collect();

        // 貸出日の降順
        result.sort_by(|a, b| b.loaned_at.cmp(&a.loaned_at));
        Ok(result)
    }

    /// 総部数を変更する（縮小ガードはセルを保持したまま判定）
    async fn resize_book(&self, book_id: BookId, new_total: CopyCount) -> Result<Book> {
        let cell = self.cell(book_id)?;
        let mut book = cell.lock().await;

        // セル獲得までの間に書籍が削除されていないか再確認
        if !self.catalog.read().unwrap().cells.contains_key(&book_id) {
            return Err(StoreError::BookNotFound);
        }

        let resized = book.clone().resize(new_total)?;
        *book = resized.clone();
        Ok(resized)
    }

    /// 書籍を削除する（貸出履歴は残す）
    async fn delete_book(&self, book_id: BookId) -> Result<()> {
        let cell = self.cell(book_id)?;

        // セルを保持したまま判定と除去を行い、貸出作成との競合を防ぐ
        let book = cell.lock().await;
        book.check_delete()?;

        let mut catalog = self.catalog.write().unwrap();
        if catalog.cells.remove(&book_id).is_none() {
            return Err(StoreError::BookNotFound);
        }
        catalog.isbn_index.remove(book.isbn.value());

        Ok(())
    }
}
