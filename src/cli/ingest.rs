use std::path::PathBuf;

use anyhow::Result;

use crate::api;
use crate::auth::{CredentialStore, TokenSource};
use crate::core::AppConfig;

pub async fn run(
    config: &AppConfig,
    store: &CredentialStore,
    youtube: Option<String>,
    pdf: Option<PathBuf>,
) -> Result<()> {
    if youtube.is_none() && pdf.is_none() {
        println!("Nothing to ingest. Pass --youtube or --pdf.");
        return Ok(());
    }

    let http = reqwest::Client::new();
    let token = store.current_access_token();

    if let Some(url) = youtube {
        let result =
            api::ingest::ingest_youtube(&http, &config.api_base_url, token.as_deref(), &url)
                .await?;
        println!("Indexed video {} ({} chunks).", result.video_id, result.chunks);
    }
    if let Some(path) = pdf {
        let result =
            api::ingest::ingest_pdf(&http, &config.api_base_url, token.as_deref(), &path).await?;
        println!("Indexed {} ({} chunks).", result.filename, result.chunks);
    }
    Ok(())
}
