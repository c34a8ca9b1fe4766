//! Member model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Library member. Holds at most one book at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    id: i64,
    name: String,
    address: String,
    /// Book currently held, 0 when none
    borrowed_book_id: i64,
}

impl Member {
    /// Unsaved member holding nothing
    pub(crate) fn new(data: &CreateMember) -> Self {
        Self {
            id: 0,
            name: data.name.clone(),
            address: data.address.clone(),
            borrowed_book_id: 0,
        }
    }

    /// Set the identifier handed out by the store. Allowed once.
    pub(crate) fn assign_id(&mut self, id: i64) -> AppResult<()> {
        if self.id != 0 {
            return Err(AppError::Internal(format!(
                "Member {} already has an identifier, refusing {}",
                self.id, id
            )));
        }
        if id <= 0 {
            return Err(AppError::Internal(format!("Invalid member identifier {}", id)));
        }
        self.id = id;
        Ok(())
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn borrowed_book_id(&self) -> i64 {
        self.borrowed_book_id
    }

    pub fn holds_book(&self) -> bool {
        self.borrowed_book_id != 0
    }

    pub(crate) fn hold(&mut self, book_id: i64) {
        self.borrowed_book_id = book_id;
    }

    pub(crate) fn release(&mut self) {
        self.borrowed_book_id = 0;
    }

    /// Case-insensitive substring match on name and address.
    /// `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.address.to_lowercase().contains(needle)
    }
}

/// Row shape of the `members` table
#[derive(Debug, FromRow)]
pub struct MemberRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub borrowed_book_id: i64,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            borrowed_book_id: row.borrowed_book_id,
        }
    }
}

/// Create member request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMember {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    /// Book to hand over right after registration, 0 for none
    #[serde(default)]
    #[validate(range(min = 0, message = "Borrowed book id cannot be negative"))]
    pub borrowed_book_id: i64,
}

impl CreateMember {
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            borrowed_book_id: 0,
        }
    }
}
