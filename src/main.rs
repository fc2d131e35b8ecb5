use anyhow::Result;
use recall::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
