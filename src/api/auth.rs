//! Login request

use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::{error::AppResult, services::Services};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginParams {
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing required field: username"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Missing required field: password"))]
    pub password: String,
}

pub async fn login(services: &mut Services, params: LoginParams) -> AppResult<Value> {
    services
        .auth
        .authenticate(&params.username, &params.password)
        .await?;
    Ok(json!({ "message": "Login successful", "username": params.username }))
}
