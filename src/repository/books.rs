//! Book domain methods on Repository

use super::Repository;
use crate::{
    error::AppResult,
    models::{book::BookRow, Book},
};

impl Repository {
    /// Insert a book row under an explicit identifier
    pub(crate) async fn books_insert(&self, id: i64, book: &Book) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, isbn, genre, cover_image, borrow_status, issued_to)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(book.title())
        .bind(book.author())
        .bind(book.isbn())
        .bind(book.genre().as_str())
        .bind(book.cover_image())
        .bind(book.is_borrowed())
        .bind(book.issued_to())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Write borrow flag and holder
    pub(crate) async fn books_update_state(&self, book: &Book) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET borrow_status = ?, issued_to = ? WHERE id = ?")
            .bind(book.is_borrowed())
            .bind(book.issued_to())
            .bind(book.id())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    pub(crate) async fn books_delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    pub(crate) async fn books_load_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, author, isbn, genre, cover_image, borrow_status, issued_to
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }
}
