//! Conversation threads on the assistant backend.
use anyhow::Result;
use serde::Deserialize;

use super::ensure_success;

#[derive(Deserialize, Debug)]
pub struct CreatedThread {
    pub thread_id: String,
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
}

pub async fn create_thread(
    http: &reqwest::Client,
    base_url: &str,
    token: Option<&str>,
) -> Result<CreatedThread> {
    let url = format!("{}/threads", base_url.trim_end_matches('/'));
    let mut request = http.post(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = ensure_success(request.send().await?).await?;
    Ok(response.json().await?)
}

/// Threads in the server-defined order, which is treated as display
/// order.
pub async fn list_threads(
    http: &reqwest::Client,
    base_url: &str,
    token: Option<&str>,
) -> Result<Vec<ThreadSummary>> {
    let url = format!("{}/threads", base_url.trim_end_matches('/'));
    let mut request = http.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = ensure_success(request.send().await?).await?;
    Ok(response.json().await?)
}
