use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod chat;
pub mod ingest;
pub mod threads;

use crate::auth::CredentialStore;
use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

#[derive(Subcommand)]
enum Command {
    /// Log in to the assistant backend and persist the session
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account and persist the session
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
    },
    /// Clear the persisted session
    Logout {},
    /// Start an interactive chat session
    Chat {
        /// Resume a conversation by thread id
        #[arg(long)]
        thread: Option<String>,
    },
    /// List conversation threads
    Threads {},
    /// Ingest source material to chat about
    Ingest {
        /// A YouTube video URL to transcribe and index
        #[arg(long)]
        youtube: Option<String>,
        /// A local PDF file to index
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let config = AppConfig::default();

    let db = async_db(&config.db_path).await?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;
    let store = Arc::new(CredentialStore::load(db).await?);

    // Handle each sub command
    match args.command {
        Some(Command::Login { email }) => {
            auth::login(&config, &store, &email).await?;
        }
        Some(Command::Signup { email, full_name }) => {
            auth::signup(&config, &store, &email, &full_name).await?;
        }
        Some(Command::Logout {}) => {
            auth::logout(&store).await?;
        }
        Some(Command::Chat { thread }) => {
            chat::run(&config, store, thread).await?;
        }
        Some(Command::Threads {}) => {
            threads::run(&config, &store).await?;
        }
        Some(Command::Ingest { youtube, pdf }) => {
            ingest::run(&config, &store, youtube, pdf).await?;
        }
        // No subcommand drops straight into chat
        None => {
            chat::run(&config, store, None).await?;
        }
    }

    Ok(())
}
