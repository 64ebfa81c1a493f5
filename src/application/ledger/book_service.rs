use crate::application::ledger::dependencies::ServiceDependencies;
use crate::application::ledger::errors::{LedgerError, Result};
use crate::domain::book::Book;
use crate::domain::commands::{RegisterBook, ResizeBook};
use crate::domain::{Actor, BookId, CatalogAction, CopyCount, Isbn};

/// 書籍を登録する
///
/// ビジネスルール：
/// - 司書以上のみが登録できる（標準ポリシー）
/// - タイトルは空でないこと、ISBNは10〜20文字、総部数は1〜1000部
/// - ISBNは蔵書内で一意であること
/// - 著者とカテゴリはカタログに存在すること
/// - 登録直後は全部数が貸出可能
pub async fn register_book(
    deps: &ServiceDependencies,
    actor: &Actor,
    command: RegisterBook,
) -> Result<Book> {
    // 1. 認可の判定
    if !deps
        .access_policy
        .authorize(actor, CatalogAction::RegisterBook)
        .is_allowed()
    {
        return Err(LedgerError::Forbidden);
    }

    // 2. 入力のバリデーション
    if command.title.trim().is_empty() {
        return Err(LedgerError::InvalidTitle);
    }
    let isbn = Isbn::new(command.isbn).map_err(|_| LedgerError::InvalidIsbn)?;
    let total_copies = CopyCount::try_from(command.total_copies)
        .map_err(|_| LedgerError::InvalidCopyCount(command.total_copies))?;

    // 3. 著者・カテゴリの存在確認（外部カタログコンテキスト）
    let author_found = deps
        .catalog_service
        .author_exists(command.author_id)
        .await
        .map_err(LedgerError::Store)?;
    if !author_found {
        return Err(LedgerError::AuthorNotFound);
    }
    let category_found = deps
        .catalog_service
        .category_exists(command.category_id)
        .await
        .map_err(LedgerError::Store)?;
    if !category_found {
        return Err(LedgerError::CategoryNotFound);
    }

    // 4. 書籍の生成と永続化（ISBNの一意性はストアが保証する）
    let book = Book::new(
        BookId::new(),
        command.title,
        isbn,
        command.author_id,
        command.category_id,
        total_copies,
    );
    deps.ledger_store.insert_book(&book).await?;

    Ok(book)
}

/// 書籍の一覧を取得する
///
/// available_only が真のときは貸出可能な部数が残る書籍に絞る。
pub async fn list_books(deps: &ServiceDependencies, available_only: bool) -> Result<Vec<Book>> {
    let books = deps.ledger_store.list_books().await?;

    if available_only {
        Ok(books
            .into_iter()
            .filter(|book| book.available_copies > 0)
            .collect())
    } else {
        Ok(books)
    }
}

/// 書籍を1件取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    let book = deps.ledger_store.get_book(book_id).await?;
    Ok(book)
}

/// 総部数を変更する
///
/// ビジネスルール：
/// - 司書以上のみが変更できる（標準ポリシー）
/// - 新しい総部数は1〜1000部
/// - 貸出中の件数を下回る縮小は拒否する
pub async fn resize_book(
    deps: &ServiceDependencies,
    actor: &Actor,
    command: ResizeBook,
) -> Result<Book> {
    // 1. 認可の判定
    if !deps
        .access_policy
        .authorize(actor, CatalogAction::ResizeBook)
        .is_allowed()
    {
        return Err(LedgerError::Forbidden);
    }

    // 2. 新しい総部数のバリデーション
    let new_total = CopyCount::try_from(command.total_copies)
        .map_err(|_| LedgerError::InvalidCopyCount(command.total_copies))?;

    // 3. 変更の適用（縮小ガードはストアが書籍単位で直列化して判定する）
    let book = deps
        .ledger_store
        .resize_book(command.book_id, new_total)
        .await?;

    Ok(book)
}

/// 書籍を削除する
///
/// ビジネスルール：
/// - 司書以上のみが削除できる（標準ポリシー）
/// - 貸出中の貸出が残っている書籍は削除できない
/// - 過去の貸出履歴は削除後も残る
pub async fn delete_book(deps: &ServiceDependencies, actor: &Actor, book_id: BookId) -> Result<()> {
    // 1. 認可の判定
    if !deps
        .access_policy
        .authorize(actor, CatalogAction::DeleteBook)
        .is_allowed()
    {
        return Err(LedgerError::Forbidden);
    }

    // 2. 削除の実行（貸出中ガードはストアが判定する）
    deps.ledger_store.delete_book(book_id).await?;

    Ok(())
}
