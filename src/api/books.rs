//! Book requests

use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::{error::AppResult, models::CreateBook, services::Services};

use super::to_data;

#[derive(Debug, Deserialize, Validate)]
pub struct BookIdParams {
    #[serde(rename = "bookID", default)]
    #[validate(range(min = 1, message = "Missing required field: bookID"))]
    pub book_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteBookParams {
    #[serde(rename = "bookID", default)]
    #[validate(range(min = 1, message = "Missing required field: bookID"))]
    pub book_id: i64,
    /// Return the book first when it is out on loan
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing required field: query"))]
    pub query: String,
}

pub fn list_books(services: &Services) -> AppResult<Value> {
    to_data(services.catalog.list_books())
}

pub async fn add_book(services: &mut Services, data: CreateBook) -> AppResult<Value> {
    let book = services.catalog.add_book(data).await?;
    Ok(json!({ "message": "Book added successfully", "book": book }))
}

pub async fn delete_book(services: &mut Services, params: DeleteBookParams) -> AppResult<Value> {
    let deleted = services
        .catalog
        .delete_book(params.book_id, params.force)
        .await?;
    let message = if deleted {
        "Book deleted successfully"
    } else {
        "No such book"
    };
    Ok(json!({ "message": message, "deleted": deleted }))
}

pub fn search_books(services: &Services, params: SearchParams) -> AppResult<Value> {
    to_data(services.catalog.search_books(&params.query))
}

pub fn lookup_book(services: &Services, params: BookIdParams) -> AppResult<Value> {
    to_data(services.catalog.get_book(params.book_id)?)
}
