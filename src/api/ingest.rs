//! Source-material ingestion endpoints.
use std::fs;
use std::path::Path;

use anyhow::Result;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;

use super::ensure_success;

#[derive(Deserialize, Debug)]
pub struct VideoIngested {
    pub status: String,
    pub video_id: String,
    pub chunks: usize,
}

#[derive(Deserialize, Debug)]
pub struct PdfIngested {
    pub status: String,
    pub filename: String,
    pub chunks: usize,
}

pub async fn ingest_youtube(
    http: &reqwest::Client,
    base_url: &str,
    token: Option<&str>,
    youtube_url: &str,
) -> Result<VideoIngested> {
    let url = format!("{}/ingest/youtube", base_url.trim_end_matches('/'));
    let mut request = http.post(url).json(&json!({"youtube_url": youtube_url}));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = ensure_success(request.send().await?).await?;
    Ok(response.json().await?)
}

pub async fn ingest_pdf(
    http: &reqwest::Client,
    base_url: &str,
    token: Option<&str>,
    path: &Path,
) -> Result<PdfIngested> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.pdf")
        .to_string();
    let bytes = fs::read(path)?;
    let part = multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/pdf")?;
    let form = multipart::Form::new().part("file", part);

    let url = format!("{}/ingest/pdf", base_url.trim_end_matches('/'));
    let mut request = http.post(url).multipart(form);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = ensure_success(request.send().await?).await?;
    Ok(response.json().await?)
}
