//! MyEvent CLI - diagnostics for the session gate.
//!
//! # Usage
//!
//! ```bash
//! # Which category does a path fall into?
//! myevent classify /misEventos/3
//!
//! # Print the route table and the matcher patterns
//! myevent routes
//!
//! # Decode a session token (no signature check)
//! myevent decode eyJhbGciOi...
//!
//! # What would the client mirror show for this cookie header?
//! myevent whoami --cookie "token=eyJhbGciOi...; theme=dark"
//!
//! # Ask the backend whether the session is still active
//! myevent check-status eyJhbGciOi... --backend http://localhost:3001
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use url::Url;

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "myevent")]
#[command(author, version, about = "MyEvent session gate diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route class of a path
    Classify {
        /// Request path, without query string
        path: String,
    },
    /// Print the route table and matcher patterns
    Routes,
    /// Decode a session token without verifying it
    Decode {
        /// The raw token
        token: String,
    },
    /// Show the session mirror snapshot for a cookie header
    Whoami {
        /// Cookie header, e.g. "token=...; theme=dark"
        #[arg(short, long)]
        cookie: String,
    },
    /// Ask the backend whether a session is still active
    CheckStatus {
        /// The raw token
        token: String,

        /// Backend base URL (default: `GATEWAY_BACKEND_URL` or <http://localhost:3001>)
        #[arg(short, long)]
        backend: Option<Url>,

        /// Timeout in milliseconds (at least 1)
        #[arg(short, long, default_value_t = 3000, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myevent_gateway=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, &mut std::io::stdout().lock()).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, out: &mut impl Write) -> Result<(), CommandError> {
    match cli.command {
        Commands::Classify { path } => commands::routes::classify(out, &path)?,
        Commands::Routes => commands::routes::list(out)?,
        Commands::Decode { token } => commands::session::decode(out, &token)?,
        Commands::Whoami { cookie } => commands::session::whoami(out, &cookie)?,
        Commands::CheckStatus {
            token,
            backend,
            timeout_ms,
        } => commands::status::check(out, &token, backend, timeout_ms).await?,
    }
    Ok(())
}
