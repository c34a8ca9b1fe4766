//! Catalog service
//!
//! The catalog is the in-memory authority over books and members. Every
//! mutation goes through the [`Store`] before or alongside the in-memory
//! change, and every operation runs to completion under `&mut self`, so no
//! two transactions ever interleave.
//!
//! Borrow invariant, checked by [`Catalog::audit`]:
//! a book is borrowed iff its holder is non-zero, the holder exists and
//! points back at the book, and every member reference points at a book
//! lent to that member.

use serde::Serialize;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, CreateMember, Member},
    repository::{Repository, Store},
};

/// One violation of the borrow invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Inconsistency {
    /// Borrow flag set but nobody holds the book
    #[serde(rename_all = "camelCase")]
    FlagWithoutHolder { book_id: i64 },
    /// Holder recorded but the borrow flag is clear
    #[serde(rename_all = "camelCase")]
    HolderWithoutFlag { book_id: i64, member_id: i64 },
    /// Book issued to a member that does not exist
    #[serde(rename_all = "camelCase")]
    UnknownHolder { book_id: i64, member_id: i64 },
    /// Book issued to a member whose reference points elsewhere
    #[serde(rename_all = "camelCase")]
    HolderDisagrees { book_id: i64, member_id: i64, member_holds: i64 },
    /// Member references a book that does not exist
    #[serde(rename_all = "camelCase")]
    UnknownBorrowedBook { member_id: i64, book_id: i64 },
    /// Member references a book that is not lent to them
    #[serde(rename_all = "camelCase")]
    BookNotLent { member_id: i64, book_id: i64 },
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::FlagWithoutHolder { book_id } => {
                write!(f, "book {} is marked borrowed without a holder", book_id)
            }
            Inconsistency::HolderWithoutFlag { book_id, member_id } => {
                write!(f, "book {} names holder {} but is not marked borrowed", book_id, member_id)
            }
            Inconsistency::UnknownHolder { book_id, member_id } => {
                write!(f, "book {} is issued to missing member {}", book_id, member_id)
            }
            Inconsistency::HolderDisagrees { book_id, member_id, member_holds } => write!(
                f,
                "book {} is issued to member {} who holds {}",
                book_id, member_id, member_holds
            ),
            Inconsistency::UnknownBorrowedBook { member_id, book_id } => {
                write!(f, "member {} holds missing book {}", member_id, book_id)
            }
            Inconsistency::BookNotLent { member_id, book_id } => {
                write!(f, "member {} holds book {} which is not lent to them", member_id, book_id)
            }
        }
    }
}

pub struct Catalog<S: Store = Repository> {
    store: S,
    books: Vec<Book>,
    members: Vec<Member>,
}

impl<S: Store> Catalog<S> {
    /// Prepare the store and load every persisted book and member.
    ///
    /// Load failures are returned as-is. Inconsistent stored state is logged
    /// and the catalog still opens.
    pub async fn open(mut store: S) -> AppResult<Self> {
        store.ensure_schema().await?;
        let books = store.load_all_books().await?;
        let members = store.load_all_members().await?;

        let catalog = Self { store, books, members };
        tracing::info!(
            books = catalog.books.len(),
            members = catalog.members.len(),
            "Catalog loaded"
        );

        for issue in catalog.audit() {
            tracing::warn!("Inconsistent stored state: {}", issue);
        }

        Ok(catalog)
    }

    /// Close the underlying store
    pub async fn close(mut self) {
        self.store.close().await;
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Persist a new book, then add it to memory under the store's id
    pub async fn add_book(&mut self, data: CreateBook) -> AppResult<Book> {
        data.validate()?;

        let mut book = Book::new(&data);
        let id = self.store.insert_book(&book).await?;

        if self.lookup_book(id).is_some() {
            return Err(diverged(
                "addBook",
                format!("store returned book id {} which is already in the catalog", id),
                None,
            ));
        }
        book.assign_id(id)
            .map_err(|e| diverged("addBook", format!("stored book got unusable id {}", id), Some(&e)))?;

        tracing::debug!(book_id = id, title = %book.title(), "Book added");
        self.books.push(book.clone());
        Ok(book)
    }

    /// Persist a new member, then add it to memory under the store's id.
    ///
    /// A non-zero `borrowed_book_id` hands that book to the new member
    /// through a regular checkout. If that checkout fails before anything
    /// was lent, the new member is removed again from memory and storage.
    pub async fn add_member(&mut self, data: CreateMember) -> AppResult<Member> {
        data.validate()?;

        let initial_book = data.borrowed_book_id;
        if initial_book != 0 {
            let book = self.get_book(initial_book)?;
            if book.is_borrowed() {
                return Err(AppError::InvalidState(format!(
                    "Book {} is already borrowed",
                    initial_book
                )));
            }
        }

        let mut member = Member::new(&data);
        let id = self.store.insert_member(&member).await?;

        if self.lookup_member(id).is_some() {
            return Err(diverged(
                "addMember",
                format!("store returned member id {} which is already in the catalog", id),
                None,
            ));
        }
        member
            .assign_id(id)
            .map_err(|e| diverged("addMember", format!("stored member got unusable id {}", id), Some(&e)))?;

        tracing::debug!(member_id = id, name = %member.name(), "Member added");
        self.members.push(member);

        if initial_book != 0 {
            if let Err(e) = self.check_out_book(initial_book, id).await {
                // A divergence already committed the loan in memory
                if !matches!(e, AppError::Divergence(_)) {
                    self.discard_member(id).await?;
                }
                return Err(e);
            }
        }

        self.get_member(id).cloned()
    }

    /// Undo a member registration whose initial checkout failed
    async fn discard_member(&mut self, id: i64) -> AppResult<()> {
        self.members.retain(|m| m.id() != id);
        self.store.delete_member(id).await.map_err(|e| {
            diverged(
                "addMember",
                format!("member {} was stored but could not be removed after a failed checkout", id),
                Some(&e),
            )
        })?;
        tracing::debug!(member_id = id, "Member registration undone");
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Remove a book from memory and storage.
    ///
    /// Returns `Ok(false)` when the book does not exist. A borrowed book is
    /// rejected unless `force` is set, in which case it is returned first.
    pub async fn delete_book(&mut self, id: i64, force: bool) -> AppResult<bool> {
        let Some(book) = self.lookup_book(id) else {
            tracing::debug!(book_id = id, "Delete of unknown book ignored");
            return Ok(false);
        };

        if book.is_borrowed() {
            let holder = book.issued_to();
            if !force {
                tracing::warn!(book_id = id, member_id = holder, "Refusing to delete borrowed book");
                return Err(AppError::InvalidState(format!(
                    "Book {} is borrowed by member {}; return it first",
                    id, holder
                )));
            }
            self.return_book(id, holder).await?;
        }

        self.books.retain(|b| b.id() != id);
        if let Err(e) = self.store.delete_book(id).await {
            tracing::error!(book_id = id, "Book removed from memory but durable delete failed: {}", e);
        }

        tracing::debug!(book_id = id, "Book deleted");
        Ok(true)
    }

    /// Remove a member from memory and storage.
    ///
    /// Returns `Ok(false)` when the member does not exist. A member holding a
    /// book is rejected unless `force` is set, in which case the book is
    /// returned first.
    pub async fn delete_member(&mut self, id: i64, force: bool) -> AppResult<bool> {
        let Some(member) = self.lookup_member(id) else {
            tracing::debug!(member_id = id, "Delete of unknown member ignored");
            return Ok(false);
        };

        if member.holds_book() {
            let book_id = member.borrowed_book_id();
            if !force {
                tracing::warn!(member_id = id, book_id, "Refusing to delete member holding a book");
                return Err(AppError::InvalidState(format!(
                    "Member {} still holds book {}; return it first",
                    id, book_id
                )));
            }
            self.return_book(book_id, id).await?;
        }

        self.members.retain(|m| m.id() != id);
        if let Err(e) = self.store.delete_member(id).await {
            tracing::error!(member_id = id, "Member removed from memory but durable delete failed: {}", e);
        }

        tracing::debug!(member_id = id, "Member deleted");
        Ok(true)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Lend a book to a member
    pub async fn check_out_book(&mut self, book_id: i64, member_id: i64) -> AppResult<()> {
        let (book_idx, member_idx) = self.resolve(book_id, member_id)?;
        let book = &self.books[book_idx];
        let member = &self.members[member_idx];

        if book.is_borrowed() {
            return Err(AppError::InvalidState(format!("Book {} is already borrowed", book_id)));
        }
        if member.holds_book() {
            return Err(AppError::InvalidState(format!(
                "Member {} already holds book {}",
                member_id,
                member.borrowed_book_id()
            )));
        }

        let mut staged = book.clone();
        staged.lend_to(member_id);
        self.commit_loan("checkOutBook", book_idx, member_idx, staged, book_id)
            .await?;

        tracing::debug!(book_id, member_id, "Book checked out");
        Ok(())
    }

    /// Take a book back from the member it was lent to
    pub async fn return_book(&mut self, book_id: i64, member_id: i64) -> AppResult<()> {
        let (book_idx, member_idx) = self.resolve(book_id, member_id)?;
        let book = &self.books[book_idx];
        let member = &self.members[member_idx];

        if !book.is_borrowed() {
            return Err(AppError::InvalidState(format!("Book {} is not borrowed", book_id)));
        }
        if book.issued_to() == 0 {
            tracing::error!(book_id, "Book is marked borrowed without a holder");
            return Err(AppError::InvalidState(format!(
                "Book {} is marked borrowed without a holder",
                book_id
            )));
        }
        if book.issued_to() != member_id {
            return Err(AppError::InvalidState(format!(
                "Book {} is issued to member {}, not {}",
                book_id,
                book.issued_to(),
                member_id
            )));
        }
        if member.borrowed_book_id() != book_id {
            tracing::error!(
                book_id,
                member_id,
                member_holds = member.borrowed_book_id(),
                "Borrower does not reference the book it was issued"
            );
            return Err(AppError::InvalidState(format!(
                "Member {} does not hold book {}",
                member_id, book_id
            )));
        }

        let mut staged = book.clone();
        staged.take_back();
        self.commit_loan("returnBook", book_idx, member_idx, staged, 0)
            .await?;

        tracing::debug!(book_id, member_id, "Book returned");
        Ok(())
    }

    /// Write the staged book, then the member reference, then apply both in
    /// memory.
    ///
    /// A failed book write leaves everything untouched. A failed member write
    /// leaves storage half-updated: memory still takes the intended state and
    /// the caller gets [`AppError::Divergence`].
    async fn commit_loan(
        &mut self,
        operation: &str,
        book_idx: usize,
        member_idx: usize,
        staged: Book,
        member_ref: i64,
    ) -> AppResult<()> {
        let book_id = staged.id();
        let member_id = self.members[member_idx].id();

        if let Err(e) = self.store.update_book_state(&staged).await {
            tracing::warn!(operation, book_id, member_id, "Book write failed, nothing changed: {}", e);
            return Err(e);
        }
        let member_write = self.store.update_member_borrow(member_id, member_ref).await;

        self.books[book_idx] = staged;
        let member = &mut self.members[member_idx];
        if member_ref == 0 {
            member.release();
        } else {
            member.hold(member_ref);
        }

        member_write.map_err(|e| {
            diverged(
                operation,
                format!(
                    "book {} was written but member {} (borrowed book {}) was not",
                    book_id, member_id, member_ref
                ),
                Some(&e),
            )
        })
    }

    fn resolve(&self, book_id: i64, member_id: i64) -> AppResult<(usize, usize)> {
        let book_idx = self
            .books
            .iter()
            .position(|b| b.id() == book_id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))?;
        let member_idx = self
            .members
            .iter()
            .position(|m| m.id() == member_id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))?;
        Ok((book_idx, member_idx))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn lookup_book(&self, id: i64) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    pub fn lookup_member(&self, id: i64) -> Option<&Member> {
        self.members.iter().find(|m| m.id() == id)
    }

    pub fn get_book(&self, id: i64) -> AppResult<&Book> {
        self.lookup_book(id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    pub fn get_member(&self, id: i64) -> AppResult<&Member> {
        self.lookup_member(id)
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    /// Books whose title, author or ISBN contains `query`, ignoring case
    pub fn search_books(&self, query: &str) -> Vec<&Book> {
        let needle = query.to_lowercase();
        self.books.iter().filter(|b| b.matches(&needle)).collect()
    }

    /// Members whose name or address contains `query`, ignoring case
    pub fn search_members(&self, query: &str) -> Vec<&Member> {
        let needle = query.to_lowercase();
        self.members.iter().filter(|m| m.matches(&needle)).collect()
    }

    pub fn list_books(&self) -> &[Book] {
        &self.books
    }

    pub fn list_members(&self) -> &[Member] {
        &self.members
    }

    /// The book a member currently holds, `None` when they hold nothing
    pub fn borrowed_book_of(&self, member_id: i64) -> AppResult<Option<&Book>> {
        let member = self.get_member(member_id)?;
        match member.borrowed_book_id() {
            0 => Ok(None),
            book_id => self.lookup_book(book_id).map(Some).ok_or_else(|| {
                AppError::InvalidState(format!(
                    "Member {} references missing book {}",
                    member_id, book_id
                ))
            }),
        }
    }

    /// Every violation of the borrow invariant, books first, in catalog order
    pub fn audit(&self) -> Vec<Inconsistency> {
        let mut issues = Vec::new();

        for book in &self.books {
            let book_id = book.id();
            let holder = book.issued_to();
            match (book.is_borrowed(), holder) {
                (true, 0) => issues.push(Inconsistency::FlagWithoutHolder { book_id }),
                (false, 0) => {}
                (false, member_id) => {
                    issues.push(Inconsistency::HolderWithoutFlag { book_id, member_id })
                }
                (true, member_id) => match self.lookup_member(member_id) {
                    None => issues.push(Inconsistency::UnknownHolder { book_id, member_id }),
                    Some(member) if member.borrowed_book_id() != book_id => {
                        issues.push(Inconsistency::HolderDisagrees {
                            book_id,
                            member_id,
                            member_holds: member.borrowed_book_id(),
                        })
                    }
                    Some(_) => {}
                },
            }
        }

        for member in self.members.iter().filter(|m| m.holds_book()) {
            let member_id = member.id();
            let book_id = member.borrowed_book_id();
            match self.lookup_book(book_id) {
                None => issues.push(Inconsistency::UnknownBorrowedBook { member_id, book_id }),
                Some(book) if !book.is_borrowed() || book.issued_to() != member_id => {
                    issues.push(Inconsistency::BookNotLent { member_id, book_id })
                }
                Some(_) => {}
            }
        }

        issues
    }
}

/// Log a memory/storage divergence with full context and build the error
fn diverged(operation: &str, detail: String, cause: Option<&AppError>) -> AppError {
    match cause {
        Some(cause) => tracing::error!(operation, cause = %cause, "Memory and storage diverged: {}", detail),
        None => tracing::error!(operation, "Memory and storage diverged: {}", detail),
    }
    AppError::Divergence(format!("{}: {}", operation, detail))
}
