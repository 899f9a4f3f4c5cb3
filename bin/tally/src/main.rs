//! Operator CLI for the tally contribution ledger.

mod cli;
mod output;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    cli::run().await
}
