use std::io::{self, Write};

use anyhow::Result;

use crate::api;
use crate::auth::CredentialStore;
use crate::core::AppConfig;

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

pub async fn login(config: &AppConfig, store: &CredentialStore, email: &str) -> Result<()> {
    let password = prompt("Password: ")?;
    let http = reqwest::Client::new();
    let response = api::auth::login(&http, &config.api_base_url, email, &password).await?;
    let full_name = response.full_name.clone();
    store.save(response.into()).await?;
    println!("Logged in as {}.", full_name);
    Ok(())
}

pub async fn signup(
    config: &AppConfig,
    store: &CredentialStore,
    email: &str,
    full_name: &str,
) -> Result<()> {
    let password = prompt("Password: ")?;
    let http = reqwest::Client::new();
    let response =
        api::auth::signup(&http, &config.api_base_url, email, &password, full_name).await?;
    let full_name = response.full_name.clone();
    store.save(response.into()).await?;
    println!("Account created for {}.", full_name);
    Ok(())
}

pub async fn logout(store: &CredentialStore) -> Result<()> {
    store.clear().await?;
    println!("Logged out.");
    Ok(())
}
