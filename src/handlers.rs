//! The handlers registered by [Registry::with_defaults](crate::Registry::with_defaults).

use hyper::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json_ok;

/// The token returned by `GET /api/user/token`.
pub const TOKEN: &str = "0123456789012345678901234567890123456789";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Handles `GET /api/user/token`. The request body is ignored.
pub async fn api_user_token(_body: Option<Bytes>) -> Result<Value, anyhow::Error> {
    json_ok(TokenResponse {
        token: TOKEN.to_string(),
    })
}
