use anyhow::Result;

use crate::api;
use crate::auth::{CredentialStore, TokenSource};
use crate::core::AppConfig;

pub async fn run(config: &AppConfig, store: &CredentialStore) -> Result<()> {
    let http = reqwest::Client::new();
    let token = store.current_access_token();
    let threads = api::threads::list_threads(&http, &config.api_base_url, token.as_deref()).await?;

    if threads.is_empty() {
        println!("No threads yet.");
        return Ok(());
    }
    for thread in threads {
        println!("{}  {}", thread.id, thread.title);
    }
    Ok(())
}
