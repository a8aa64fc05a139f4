use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::config::DatabaseArgs;
use commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "sidecar", version, about = "Read-only MySQL gateway for MCP agents")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP gateway over SSE.
    Serve(ServeArgs),

    /// Verify the database is reachable by running `SELECT 1`.
    Check(DatabaseArgs),

    /// Show whether the admission gate would let a statement through.
    Classify {
        /// SQL text to classify.
        sql: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve(args) => commands::serve::execute(args).await?,
        Command::Check(args) => commands::check::execute(args).await?,
        Command::Classify { sql } => commands::classify::execute(&sql),
    }

    Ok(())
}
