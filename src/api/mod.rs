//! Line-oriented JSON request handling
//!
//! Each input line is one request object, `{"id", "method", ...params}`.
//! Each request produces exactly one response line, in input order.

pub mod auth;
pub mod books;
pub mod loans;
pub mod members;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use validator::Validate;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    services::Services,
};

/// Incoming request envelope
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: i64,
    pub method: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Outgoing response envelope
#[derive(Debug, Serialize, PartialEq)]
pub struct Response {
    pub id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

impl Response {
    pub fn ok(id: i64, data: Value) -> Self {
        Self {
            id,
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(id: i64, err: &AppError) -> Self {
        let body = ErrorResponse::from(err);
        Self {
            id,
            success: false,
            data: None,
            error: Some(body.message),
            code: Some(body.code),
        }
    }
}

/// Decode request parameters and run field validation
pub(crate) fn params<T: DeserializeOwned + Validate>(params: Map<String, Value>) -> AppResult<T> {
    let parsed: T = serde_json::from_value(Value::Object(params))
        .map_err(|e| AppError::Validation(format!("Invalid parameters: {}", e)))?;
    parsed.validate()?;
    Ok(parsed)
}

pub(crate) fn to_data<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(format!("Failed to encode response: {}", e)))
}

/// Route one decoded request to its handler
pub async fn dispatch(services: &mut Services, request: Request) -> AppResult<Value> {
    let Request { method, params: p, .. } = request;

    match method.as_str() {
        "ping" => Ok(json!({ "message": "pong" })),
        "audit" => to_data(services.catalog.audit()),

        "listBooks" => books::list_books(services),
        "addBook" => books::add_book(services, params(p)?).await,
        "deleteBook" | "delete-book" => books::delete_book(services, params(p)?).await,
        "searchBooks" => books::search_books(services, params(p)?),
        "lookupBook" => books::lookup_book(services, params(p)?),

        "listMembers" => members::list_members(services),
        "addMember" => members::add_member(services, params(p)?).await,
        "deleteMember" | "delete-member" => members::delete_member(services, params(p)?).await,
        "searchMember" => members::search_member(services, params(p)?),

        "checkoutBook" => loans::checkout_book(services, params(p)?).await,
        "returnBook" => loans::return_book(services, params(p)?).await,
        "borrowedBooks" => loans::borrowed_books(services, params(p)?),

        "login" => auth::login(services, params(p)?).await,

        other => Err(AppError::Validation(format!("Unknown method: {}", other))),
    }
}

/// Decode, dispatch and wrap one request line
pub async fn handle_line(services: &mut Services, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Undecodable request: {}", e);
            return Response::failure(0, &AppError::Validation(format!("Malformed request: {}", e)));
        }
    };

    let id = request.id;
    tracing::debug!(id, method = %request.method, "Request");

    match dispatch(services, request).await {
        Ok(data) => Response::ok(id, data),
        Err(e) => {
            tracing::debug!(id, code = e.code() as u32, "Request failed: {}", e);
            Response::failure(id, &e)
        }
    }
}

/// Answer requests from `reader` on `writer` until end of input
pub async fn serve<R, W>(services: &mut Services, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(services, &line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
    }

    tracing::info!(requests = handled, "Input closed");
    Ok(())
}
