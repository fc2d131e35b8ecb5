//! Typed calls to the assistant backend.
//!
//! Everything here is request/response glue; the streaming chat exchange
//! itself lives in `crate::chat`.
use anyhow::{Result, bail};

pub mod auth;
pub mod ingest;
pub mod threads;

/// Server-produced errors carry a human-readable `detail` field. Returns
/// `None` when the body isn't parseable as one.
pub(crate) async fn detail_message(response: reqwest::Response) -> Option<String> {
    response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body["detail"].as_str().map(str::to_string))
}

/// Turn a non-success response into an error carrying the server's
/// detail message when there is one.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match detail_message(response).await {
        Some(detail) => bail!("{} ({})", detail, status),
        None => bail!("Request failed ({})", status),
    }
}
