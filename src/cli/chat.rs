use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::api;
use crate::auth::{CredentialStore, TokenSource};
use crate::chat::ChatSession;
use crate::core::AppConfig;

pub async fn run(
    config: &AppConfig,
    store: Arc<CredentialStore>,
    thread: Option<String>,
) -> Result<()> {
    let mut rl = DefaultEditor::new().expect("Editor failed");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let session = ChatSession::new(&config.api_base_url, store.clone(), Some(tx));
    if thread.is_some() {
        session.select_conversation(thread);
    }

    // Render fragments as the reply streams in
    let printer = tokio::spawn(async move {
        while let Some(fragment) = rx.recv().await {
            print!("{}", fragment);
            let _ = std::io::stdout().flush();
        }
    });

    println!("Type a question, /new for a fresh conversation, /threads to list them.");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line == "/new" {
                    match session.new_conversation().await {
                        Ok(created) => {
                            println!("Started {} ({})", created.title, created.thread_id)
                        }
                        Err(err) => println!("Error: {}", err),
                    }
                    continue;
                }
                if line == "/threads" {
                    let http = reqwest::Client::new();
                    let token = store.current_access_token();
                    match api::threads::list_threads(
                        &http,
                        &config.api_base_url,
                        token.as_deref(),
                    )
                    .await
                    {
                        Ok(threads) => {
                            for t in threads {
                                println!("{}  {}", t.id, t.title);
                            }
                        }
                        Err(err) => println!("Error: {}", err),
                    }
                    continue;
                }

                session.send(&line).await;
                println!();
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    printer.abort();
    Ok(())
}
