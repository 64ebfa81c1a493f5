use crate::domain::book::Book;
use crate::domain::loan::{self, Loan, StoredStatus};
use crate::domain::{AuthorId, BookId, CategoryId, CopyCount, Isbn, LoanId, LoanScope, UserId};
use crate::ports::ledger_store::{LedgerStore as LedgerStoreTrait, Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// 行データの変換で発生した不整合をBackendエラーに包む
fn invalid_data(message: String) -> StoreError {
    StoreError::Backend(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

/// 一意制約違反かどうかを制約名で判定する
fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.constraint() == Some(constraint),
        _ => false,
    }
}

/// PostgreSQLの行データをBookに変換する
///
/// 在庫カウンタのINTからu32への変換とISBNの検証でエラーハンドリングを行う。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let total_i32: i32 = row.get("total_copies");
    let total_copies = CopyCount::try_from(i64::from(total_i32))
        .map_err(|_| invalid_data(format!("total_copies out of range: {}", total_i32)))?;

    let available_i32: i32 = row.get("available_copies");
    let available_copies: u32 = available_i32
        .try_into()
        .map_err(|_| invalid_data(format!("available_copies out of range: {}", available_i32)))?;

    let isbn_str: String = row.get("isbn");
    let isbn = Isbn::new(isbn_str).map_err(|e| invalid_data(format!("invalid isbn: {:?}", e)))?;

    Ok(Book {
        book_id: BookId::from_uuid(row.get("book_id")),
        title: row.get("title"),
        isbn,
        author_id: AuthorId::from_uuid(row.get("author_id")),
        category_id: CategoryId::from_uuid(row.get("category_id")),
        total_copies,
        available_copies,
    })
}

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = StoredStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        holder_id: UserId::from_uuid(row.get("holder_id")),
        loaned_at: row.get("loaned_at"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
        status,
    })
}

/// PostgreSQL実装：台帳ストア
///
/// 在庫を変更する操作は1トランザクションで実行し、対象書籍の行を
/// `SELECT ... FOR UPDATE` でロックして書籍単位に直列化する。
/// 別書籍の操作は互いにブロックしない。
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    /// PostgreSQLコネクションプールから新しいLedgerStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStoreTrait for LedgerStore {
    /// 書籍を登録する
    ///
    /// ISBNの一意性は books_isbn_key 制約で保証する。
    async fn insert_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                book_id,
                title,
                isbn,
                author_id,
                category_id,
                total_copies,
                available_copies
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(book.isbn.value())
        .bind(book.author_id.value())
        .bind(book.category_id.value())
        .bind(book.total_copies.value() as i32)
        .bind(book.available_copies as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "books_isbn_key") {
                StoreError::DuplicateIsbn
            } else {
                StoreError::from(e)
            }
        })?;

        Ok(())
    }

    async fn get_book(&self, book_id: BookId) -> Result<Book> {
        let row = sqlx::query(
            r#"
            SELECT book_id, title, isbn, author_id, category_id,
                   total_copies, available_copies
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_row_to_book(&row),
            None => Err(StoreError::BookNotFound),
        }
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, title, isbn, author_id, category_id,
                   total_copies, available_copies
            FROM books
            ORDER BY title ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    /// 貸出を作成する
    ///
    /// 対象書籍の行ロックの下で、二重貸出の確認・在庫の確保・貸出の
    /// 記録を1トランザクションで行う。idx_loans_active_holder_book の
    /// 部分一意索引が二重貸出の最終防衛線になる。
    async fn create_loan(&self, new_loan: &Loan) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // 対象書籍の行をロック（書籍単位の直列化境界）
        let row = sqlx::query(
            r#"
            SELECT book_id, title, isbn, author_id, category_id,
                   total_copies, available_copies
            FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(new_loan.book_id.value())
        .fetch_optional(&mut *tx)
        .await?;
        let book = match row {
            Some(row) => map_row_to_book(&row)?,
            None => return Err(StoreError::BookNotFound),
        };

        // 同一利用者が同一書籍を貸出中なら拒否
        let duplicate: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE holder_id = $1 AND book_id = $2 AND status = 'active'
            )
            "#,
        )
        .bind(new_loan.holder_id.value())
        .bind(new_loan.book_id.value())
        .fetch_one(&mut *tx)
        .await?;
        if duplicate {
            return Err(StoreError::DuplicateActiveLoan);
        }

        // 在庫の確保（判定は純粋関数）
        let reserved = book.reserve_copy()?;

        sqlx::query("UPDATE books SET available_copies = $2 WHERE book_id = $1")
            .bind(new_loan.book_id.value())
            .bind(reserved.available_copies as i32)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                book_id,
                holder_id,
                loaned_at,
                due_date,
                returned_at,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(new_loan.loan_id.value())
        .bind(new_loan.book_id.value())
        .bind(new_loan.holder_id.value())
        .bind(new_loan.loaned_at)
        .bind(new_loan.due_date)
        .bind(new_loan.returned_at)
        .bind(new_loan.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "idx_loans_active_holder_book") {
                StoreError::DuplicateActiveLoan
            } else {
                StoreError::from(e)
            }
        })?;

        tx.commit().await?;
        Ok(())
    }

    /// 返却を記録する
    ///
    /// 貸出行、次に書籍行の順でロックし、返却の記録と在庫の解放を
    /// 1トランザクションで行う。ロック順序は常に 貸出 → 書籍。
    async fn close_loan(&self, loan_id: LoanId, returned_at: DateTime<Utc>) -> Result<Loan> {
        let mut tx = self.pool.begin().await?;

        // 貸出行をロックして現在の状態を確定する
        let row = sqlx::query(
            r#"
            SELECT loan_id, book_id, holder_id, loaned_at, due_date,
                   returned_at, status
            FROM loans
            WHERE loan_id = $1
            FOR UPDATE
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&mut *tx)
        .await?;
        let current = match row {
            Some(row) => map_row_to_loan(&row)?,
            None => return Err(StoreError::LoanNotFound),
        };

        // 返却済みガード（判定は純粋関数）
        let closed = loan::close_loan(&current, returned_at)?;

        // 書籍行をロックして在庫を戻す
        let book_row = sqlx::query(
            r#"
            SELECT book_id, title, isbn, author_id, category_id,
                   total_copies, available_copies
            FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(current.book_id.value())
        .fetch_optional(&mut *tx)
        .await?;
        let book = match book_row {
            Some(row) => map_row_to_book(&row)?,
            None => return Err(StoreError::BookNotFound),
        };
        let released = book.release_copy();

        sqlx::query(
            r#"
            UPDATE loans
            SET status = $2, returned_at = $3
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .bind(closed.status.as_str())
        .bind(closed.returned_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available_copies = $2 WHERE book_id = $1")
            .bind(current.book_id.value())
            .bind(released.available_copies as i32)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(closed)
    }

    async fn get_loan(&self, loan_id: LoanId) -> Result<Loan> {
        let row = sqlx::query(
            r#"
            SELECT loan_id, book_id, holder_id, loaned_at, due_date,
                   returned_at, status
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_row_to_loan(&row),
            None => Err(StoreError::LoanNotFound),
        }
    }

    async fn list_loans(&self, scope: &LoanScope) -> Result<Vec<Loan>> {
        let rows = match scope {
            LoanScope::All => {
                sqlx::query(
                    r#"
                    SELECT loan_id, book_id, holder_id, loaned_at, due_date,
                           returned_at, status
                    FROM loans
                    ORDER BY loaned_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            LoanScope::Own(holder_id) => {
                sqlx::query(
                    r#"
                    SELECT loan_id, book_id, holder_id, loaned_at, due_date,
                           returned_at, status
                    FROM loans
                    WHERE holder_id = $1
                    ORDER BY loaned_at DESC
                    "#,
                )
                .bind(holder_id.value())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(map_row_to_loan).collect()
    }

    /// 総部数を変更する
    ///
    /// 対象書籍の行ロックの下で縮小ガードを判定し、在庫を再計算する。
    async fn resize_book(&self, book_id: BookId, new_total: CopyCount) -> Result<Book> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT book_id, title, isbn, author_id, category_id,
                   total_copies, available_copies
            FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *tx)
        .await?;
        let book = match row {
            Some(row) => map_row_to_book(&row)?,
            None => return Err(StoreError::BookNotFound),
        };

        // 縮小ガード（判定は純粋関数）
        let resized = book.resize(new_total)?;

        sqlx::query(
            r#"
            UPDATE books
            SET total_copies = $2, available_copies = $3
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.value())
        .bind(resized.total_copies.value() as i32)
        .bind(resized.available_copies as i32)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(resized)
    }

    /// 書籍を削除する
    ///
    /// 行ロックの下で貸出中ガードを判定する。loansに外部キーを張らない
    /// ため、過去の貸出履歴は削除後も残る。
    async fn delete_book(&self, book_id: BookId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT book_id, title, isbn, author_id, category_id,
                   total_copies, available_copies
            FROM books
            WHERE book_id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *tx)
        .await?;
        let book = match row {
            Some(row) => map_row_to_book(&row)?,
            None => return Err(StoreError::BookNotFound),
        };

        // 貸出中ガード（判定は純粋関数）
        book.check_delete()?;

        sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(book_id.value())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
