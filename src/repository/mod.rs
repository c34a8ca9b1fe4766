//! Repository layer for database operations
//!
//! [`Store`] is the narrow contract the catalog relies on. [`Repository`]
//! implements it on top of a SQLite pool.

pub mod books;
pub mod credentials;
pub mod ids;
pub mod members;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{
    config::{CatalogConfig, DatabaseConfig},
    error::{AppError, AppResult},
    models::{Book, Member},
};

pub use credentials::CredentialsRepository;
pub use ids::IdAllocator;

/// Durable storage for books and members, keyed by identifier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send {
    /// Create missing tables. Idempotent.
    async fn ensure_schema(&mut self) -> AppResult<()>;

    /// Persist a new book and return its authoritative identifier
    async fn insert_book(&mut self, book: &Book) -> AppResult<i64>;

    /// Persist a new member and return its authoritative identifier
    async fn insert_member(&mut self, member: &Member) -> AppResult<i64>;

    /// Write the borrow flag and holder of an existing book
    async fn update_book_state(&mut self, book: &Book) -> AppResult<()>;

    /// Write the borrowed-book reference of an existing member
    async fn update_member_borrow(&mut self, member_id: i64, borrowed_book_id: i64) -> AppResult<()>;

    async fn delete_book(&mut self, id: i64) -> AppResult<()>;

    async fn delete_member(&mut self, id: i64) -> AppResult<()>;

    /// Every stored book, ordered by identifier
    async fn load_all_books(&mut self) -> AppResult<Vec<Book>>;

    /// Every stored member, ordered by identifier
    async fn load_all_members(&mut self) -> AppResult<Vec<Member>>;

    async fn close(&mut self);
}

const CREATE_BOOKS: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        isbn TEXT NOT NULL,
        genre TEXT NOT NULL DEFAULT 'unknown',
        cover_image TEXT,
        borrow_status INTEGER NOT NULL,
        issued_to INTEGER NOT NULL
    )
"#;

const CREATE_MEMBERS: &str = r#"
    CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        address TEXT NOT NULL,
        borrowed_book_id INTEGER NOT NULL
    )
"#;

const CREATE_CREDENTIALS: &str = r#"
    CREATE TABLE IF NOT EXISTS credentials (
        login TEXT PRIMARY KEY,
        password_hash TEXT NOT NULL
    )
"#;

/// SQLite-backed store
pub struct Repository {
    pool: Pool<Sqlite>,
    book_ids: IdAllocator,
    member_ids: IdAllocator,
}

impl Repository {
    /// Open (or create) the database at `config.url`
    pub async fn open(config: &DatabaseConfig, catalog: &CatalogConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::StoreUnavailable(format!("{}: {}", config.url, e)))?
            .create_if_missing(config.create_if_missing);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| AppError::StoreUnavailable(format!("{}: {}", config.url, e)))?;

        tracing::info!("Opened store at {}", config.url);

        Ok(Self::new(pool, catalog))
    }

    /// Wrap an existing pool
    pub fn new(pool: Pool<Sqlite>, catalog: &CatalogConfig) -> Self {
        Self {
            pool,
            book_ids: IdAllocator::new(catalog.first_book_id),
            member_ids: IdAllocator::new(catalog.first_member_id),
        }
    }

    /// Credential table access sharing this repository's pool
    pub fn credentials(&self) -> CredentialsRepository {
        CredentialsRepository::new(self.pool.clone())
    }

    /// Next identifiers the allocators would hand out (book, member)
    pub fn next_ids(&self) -> (i64, i64) {
        (self.book_ids.peek(), self.member_ids.peek())
    }

    async fn max_id(&self, table: &str) -> AppResult<i64> {
        let max: i64 = sqlx::query_scalar(&format!("SELECT COALESCE(MAX(id), 0) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }
}

#[async_trait]
impl Store for Repository {
    async fn ensure_schema(&mut self) -> AppResult<()> {
        for ddl in [CREATE_BOOKS, CREATE_MEMBERS, CREATE_CREDENTIALS] {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        // Stored rows keep their ids; new ones must land above them.
        let max_book = self.max_id("books").await?;
        let max_member = self.max_id("members").await?;
        self.book_ids.observe(max_book);
        self.member_ids.observe(max_member);

        tracing::debug!(
            next_book_id = self.book_ids.peek(),
            next_member_id = self.member_ids.peek(),
            "Schema ready"
        );
        Ok(())
    }

    async fn insert_book(&mut self, book: &Book) -> AppResult<i64> {
        let id = self.book_ids.allocate();
        self.books_insert(id, book).await?;
        Ok(id)
    }

    async fn insert_member(&mut self, member: &Member) -> AppResult<i64> {
        let id = self.member_ids.allocate();
        self.members_insert(id, member).await?;
        Ok(id)
    }

    async fn update_book_state(&mut self, book: &Book) -> AppResult<()> {
        self.books_update_state(book).await
    }

    async fn update_member_borrow(&mut self, member_id: i64, borrowed_book_id: i64) -> AppResult<()> {
        self.members_update_borrow(member_id, borrowed_book_id).await
    }

    async fn delete_book(&mut self, id: i64) -> AppResult<()> {
        self.books_delete(id).await
    }

    async fn delete_member(&mut self, id: i64) -> AppResult<()> {
        self.members_delete(id).await
    }

    async fn load_all_books(&mut self) -> AppResult<Vec<Book>> {
        self.books_load_all().await
    }

    async fn load_all_members(&mut self) -> AppResult<Vec<Member>> {
        self.members_load_all().await
    }

    async fn close(&mut self) {
        self.pool.close().await;
        tracing::info!("Store closed");
    }
}
