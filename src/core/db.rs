//! SQLite storage for locally persisted session state.
use std::fs;
use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use tokio_rusqlite::Connection as AsyncConnection;

/// Create the schema if it doesn't already exist. Safe to call on every
/// startup.
pub fn initialize_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS credentials (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;
    Ok(())
}

/// Open an async connection to the database, creating the storage
/// directory if needed.
pub async fn async_db(db_path: &str) -> Result<AsyncConnection> {
    fs::create_dir_all(db_path)?;
    let file = Path::new(db_path).join("recall.sqlite3");
    let conn = AsyncConnection::open(file).await?;
    Ok(conn)
}
