//! zsync store tool
//!
//! Lists, shows and wipes the snapshots that coherency layers keep in a
//! shared SQLite store.
//!
//! Usage:
//!   zsync --store app.db keys
//!   zsync --store app.db wipe --substring

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use zsync_cli::{namespaced_keys, open_layer, show_entry, token_for, wipe};
use zsync_coherence::{CoherencyConfig, DEFAULT_NAMESPACE};

#[derive(Parser, Debug)]
#[command(name = "zsync")]
#[command(about = "Inspect and maintain a zsync shared store")]
struct Args {
    /// Path to the SQLite store
    #[arg(short, long)]
    store: PathBuf,

    /// Namespace marker for snapshot keys
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List keys inside the namespace
    Keys,
    /// Print the snapshot stored at a key
    Get { key: String },
    /// Print the token a locator resolves to
    Token {
        locator: String,
        /// Client id prepended to the locator
        #[arg(long)]
        client_id: Option<String>,
    },
    /// Remove every key in the namespace
    Wipe {
        /// Also remove keys that merely contain the marker
        #[arg(long)]
        substring: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = CoherencyConfig {
        namespace: args.namespace,
        ..Default::default()
    };

    match args.command {
        Command::Keys => {
            let layer = open_layer(&args.store, config)?;
            for key in namespaced_keys(&layer)? {
                println!("{key}");
            }
        }
        Command::Get { key } => {
            let layer = open_layer(&args.store, config)?;
            match show_entry(&layer, &key)? {
                Some(entry) => println!("{entry}"),
                None => info!("No entry at {}", key),
            }
        }
        Command::Token { locator, client_id } => {
            let layer = open_layer(&args.store, config)?;
            println!("{}", token_for(&layer, &locator, client_id.as_deref())?);
        }
        Command::Wipe { substring } => {
            let removed = wipe(&args.store, config, substring)?;
            println!("Removed {removed} entries");
        }
    }
    Ok(())
}
