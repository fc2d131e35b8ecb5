//! Session credentials and their persistence.
//!
//! Three entries are persisted together: the access token, the refresh
//! token, and the serialized user record. A session only counts as
//! hydrated when all three are present.
use std::sync::RwLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::Connection;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_DATA_KEY: &str = "user_data";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
}

#[derive(Clone, Debug)]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Read-side capability for attaching a bearer token to a request.
/// Consumers get this injected rather than reaching into storage so they
/// can be tested against a stub.
pub trait TokenSource {
    fn current_access_token(&self) -> Option<String>;
}

/// Owns the persisted session. Everything else only reads from it; writes
/// happen at session boundaries (login, signup, logout).
pub struct CredentialStore {
    db: Connection,
    session: RwLock<Option<SessionCredentials>>,
}

impl CredentialStore {
    /// Hydrate the store from the database. A partial record (e.g. after
    /// an interrupted logout) counts as logged out.
    pub async fn load(db: Connection) -> Result<Self> {
        let entries = db
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT key, value FROM credentials")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let mut access_token = None;
        let mut refresh_token = None;
        let mut user_data = None;
        for (key, value) in entries {
            match key.as_str() {
                ACCESS_TOKEN_KEY => access_token = Some(value),
                REFRESH_TOKEN_KEY => refresh_token = Some(value),
                USER_DATA_KEY => user_data = Some(value),
                _ => {}
            }
        }

        let session = match (access_token, refresh_token, user_data) {
            (Some(access_token), Some(refresh_token), Some(user_data)) => {
                let user = serde_json::from_str(&user_data)?;
                Some(SessionCredentials {
                    access_token,
                    refresh_token,
                    user,
                })
            }
            _ => None,
        };

        Ok(Self {
            db,
            session: RwLock::new(session),
        })
    }

    /// Persist a new session, replacing any previous one. All three
    /// entries are written in one transaction.
    pub async fn save(&self, credentials: SessionCredentials) -> Result<()> {
        let access_token = credentials.access_token.clone();
        let refresh_token = credentials.refresh_token.clone();
        let user_data = serde_json::to_string(&credentials.user)?;

        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;
                for (key, value) in [
                    (ACCESS_TOKEN_KEY, &access_token),
                    (REFRESH_TOKEN_KEY, &refresh_token),
                    (USER_DATA_KEY, &user_data),
                ] {
                    tx.execute(
                        "INSERT INTO credentials (key, value) VALUES (?1, ?2)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                        (key, value),
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;

        *self
            .session
            .write()
            .expect("Unable to write credential state") = Some(credentials);
        Ok(())
    }

    /// Destroy the session. All three entries are cleared together.
    pub async fn clear(&self) -> Result<()> {
        self.db
            .call(|conn| {
                conn.execute("DELETE FROM credentials", ())?;
                Ok(())
            })
            .await?;

        *self
            .session
            .write()
            .expect("Unable to write credential state") = None;
        Ok(())
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session
            .read()
            .expect("Unable to read credential state")
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .expect("Unable to read credential state")
            .is_some()
    }
}

impl TokenSource for CredentialStore {
    fn current_access_token(&self) -> Option<String> {
        self.session
            .read()
            .expect("Unable to read credential state")
            .as_ref()
            .map(|s| s.access_token.clone())
    }
}
