//! Checkout and return requests

use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::{error::AppResult, services::Services};

#[derive(Debug, Deserialize, Validate)]
pub struct LoanParams {
    #[serde(rename = "bookID", default)]
    #[validate(range(min = 1, message = "Missing required field: bookID"))]
    pub book_id: i64,
    #[serde(rename = "memberID", default)]
    #[validate(range(min = 1, message = "Missing required field: memberID"))]
    pub member_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MemberIdParams {
    #[serde(rename = "memberID", default)]
    #[validate(range(min = 1, message = "Missing required field: memberID"))]
    pub member_id: i64,
}

pub async fn checkout_book(services: &mut Services, params: LoanParams) -> AppResult<Value> {
    services
        .catalog
        .check_out_book(params.book_id, params.member_id)
        .await?;
    Ok(json!({ "message": "Book checked out successfully" }))
}

pub async fn return_book(services: &mut Services, params: LoanParams) -> AppResult<Value> {
    services
        .catalog
        .return_book(params.book_id, params.member_id)
        .await?;
    Ok(json!({ "message": "Book returned successfully" }))
}

/// The member together with the book they hold, `null` when none
pub fn borrowed_books(services: &Services, params: MemberIdParams) -> AppResult<Value> {
    let member = services.catalog.get_member(params.member_id)?;
    let book = services.catalog.borrowed_book_of(params.member_id)?;
    Ok(json!({ "member": member, "book": book }))
}
