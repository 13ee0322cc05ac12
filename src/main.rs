//! # UPC Match CLI (`upcm`)
//!
//! The `upcm` binary manages the product catalog and answers match queries.
//!
//! ## Usage
//!
//! ```bash
//! upcm --config ./config/upcm.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `upcm init` | Create the SQLite catalog and run schema migrations |
//! | `upcm import <file>` | Load products from a JSON-lines file |
//! | `upcm match "<query>"` | Match free text against the catalog |
//! | `upcm serve` | Start the HTTP matching server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use upc_match::{config, import, matcher, migrate, server};

/// UPC Match — fuzzy product-to-UPC matching over a SQLite catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/upcm.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "upcm",
    about = "UPC Match — fuzzy product-to-UPC matching over a SQLite catalog",
    version,
    long_about = "UPC Match decomposes free-text product descriptions into brand and product \
    terms, runs weighted search strategies against a product catalog, and returns the best \
    matching barcode. It serves results from a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/upcm.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog database schema.
    ///
    /// Creates the SQLite database file and the products table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Load products from a JSON-lines file.
    ///
    /// Each line is `{"upc": "...", "name": "...", "brand": "..."}`.
    /// Existing rows with the same UPC are updated; malformed lines are
    /// skipped with a warning.
    Import {
        /// Path to the JSONL file.
        file: PathBuf,
    },

    /// Match a free-text product description against the catalog.
    ///
    /// Prints the best-matching UPC, the distinct candidate count, and the
    /// top three candidates with scores.
    Match {
        /// The product description to match.
        query: String,

        /// Print the raw JSON outcome instead of the human-readable form.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP matching server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `GET /match` and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Catalog database initialized successfully.");
        }
        Commands::Import { file } => {
            import::run_import(&cfg, &file).await?;
        }
        Commands::Match { query, json } => {
            matcher::run_match_command(&cfg, &query, json).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
