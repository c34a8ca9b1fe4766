//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::enums::Genre;
use crate::error::{AppError, AppResult};

/// Book held by the catalog
///
/// `borrowed` and `issued_to` only change together, through
/// [`Book::lend_to`] and [`Book::take_back`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    id: i64,
    title: String,
    author: String,
    isbn: String,
    genre: Genre,
    cover_image: Option<String>,
    borrowed: bool,
    /// Borrowing member, 0 when on the shelf
    issued_to: i64,
}

impl Book {
    /// Unsaved book, not yet identified and not borrowed
    pub(crate) fn new(data: &CreateBook) -> Self {
        Self {
            id: 0,
            title: data.title.clone(),
            author: data.author.clone(),
            isbn: data.isbn.clone(),
            genre: data.genre.as_deref().map(Genre::parse).unwrap_or_default(),
            cover_image: data.cover_image.clone().filter(|c| !c.is_empty()),
            borrowed: false,
            issued_to: 0,
        }
    }

    /// Set the identifier handed out by the store. Allowed once.
    pub(crate) fn assign_id(&mut self, id: i64) -> AppResult<()> {
        if self.id != 0 {
            return Err(AppError::Internal(format!(
                "Book {} already has an identifier, refusing {}",
                self.id, id
            )));
        }
        if id <= 0 {
            return Err(AppError::Internal(format!("Invalid book identifier {}", id)));
        }
        self.id = id;
        Ok(())
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    pub fn is_borrowed(&self) -> bool {
        self.borrowed
    }

    pub fn issued_to(&self) -> i64 {
        self.issued_to
    }

    pub(crate) fn lend_to(&mut self, member_id: i64) {
        self.borrowed = true;
        self.issued_to = member_id;
    }

    pub(crate) fn take_back(&mut self) {
        self.borrowed = false;
        self.issued_to = 0;
    }

    /// Case-insensitive substring match on title, author and ISBN.
    /// `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.author, &self.isbn]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Row shape of the `books` table
#[derive(Debug, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    pub cover_image: Option<String>,
    pub borrow_status: bool,
    pub issued_to: i64,
}

impl From<BookRow> for Book {
    /// Rows keep their stored borrow columns verbatim, even inconsistent ones,
    /// so the catalog audit can see them.
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            genre: Genre::parse(&row.genre),
            cover_image: row.cover_image,
            borrowed: row.borrow_status,
            issued_to: row.issued_to,
        }
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    /// Free text, unrecognised values become `unknown`
    pub genre: Option<String>,
    pub cover_image: Option<String>,
}

impl CreateBook {
    pub fn new(title: &str, isbn: &str, author: &str, genre: &str) -> Self {
        Self {
            title: title.to_string(),
            isbn: isbn.to_string(),
            author: author.to_string(),
            genre: Some(genre.to_string()),
            cover_image: None,
        }
    }

    pub fn with_cover_image(mut self, cover_image: &str) -> Self {
        self.cover_image = Some(cover_image.to_string());
        self
    }
}
