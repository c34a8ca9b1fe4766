//! Member requests

use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::CreateMember,
    services::Services,
};

use super::to_data;

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteMemberParams {
    #[serde(rename = "memberID", default)]
    #[validate(range(min = 1, message = "Missing required field: memberID"))]
    pub member_id: i64,
    /// Return the held book first
    #[serde(default)]
    pub force: bool,
}

/// Search by exact id or by name/address substring
#[derive(Debug, Deserialize, Validate)]
pub struct SearchMemberParams {
    #[serde(rename = "memberID", default)]
    #[validate(range(min = 0))]
    pub member_id: i64,
    #[serde(default)]
    pub query: String,
}

pub fn list_members(services: &Services) -> AppResult<Value> {
    to_data(services.catalog.list_members())
}

pub async fn add_member(services: &mut Services, data: CreateMember) -> AppResult<Value> {
    let member = services.catalog.add_member(data).await?;
    Ok(json!({ "message": "Member added successfully", "member": member }))
}

pub async fn delete_member(services: &mut Services, params: DeleteMemberParams) -> AppResult<Value> {
    let deleted = services
        .catalog
        .delete_member(params.member_id, params.force)
        .await?;
    let message = if deleted {
        "Member deleted successfully"
    } else {
        "No such member"
    };
    Ok(json!({ "message": message, "deleted": deleted }))
}

/// A single member object for `memberID`, a list for `query`
pub fn search_member(services: &Services, params: SearchMemberParams) -> AppResult<Value> {
    if params.member_id != 0 {
        return to_data(services.catalog.get_member(params.member_id)?);
    }
    if params.query.is_empty() {
        return Err(AppError::Validation(
            "Missing required field: memberID or query".to_string(),
        ));
    }
    to_data(services.catalog.search_members(&params.query))
}
