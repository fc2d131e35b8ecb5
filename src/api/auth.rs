//! Authentication endpoints.
use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use super::ensure_success;
use crate::auth::{SessionCredentials, UserProfile};

#[derive(Deserialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user_id: String,
    pub full_name: String,
}

impl From<AuthResponse> for SessionCredentials {
    fn from(response: AuthResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            user: UserProfile {
                id: response.user_id,
                full_name: response.full_name,
            },
        }
    }
}

pub async fn login(
    http: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<AuthResponse> {
    let url = format!("{}/auth/login", base_url.trim_end_matches('/'));
    let response = http
        .post(url)
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?;
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}

pub async fn signup(
    http: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<AuthResponse> {
    let url = format!("{}/auth/signup", base_url.trim_end_matches('/'));
    let response = http
        .post(url)
        .json(&json!({
            "email": email,
            "password": password,
            "full_name": full_name
        }))
        .send()
        .await?;
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}
