//! cartsync CLI - database migrations and list inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront migrations (list tables and session store)
//! cartsync-cli migrate
//!
//! # Show an identified visitor's cart
//! cartsync-cli lists show --owner 5b0c...e1 --kind cart
//!
//! # Show both of their lists
//! cartsync-cli lists show --owner 5b0c...e1
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use cartsync_core::{ListKind, OwnerId};

mod commands;

#[derive(Parser)]
#[command(name = "cartsync-cli")]
#[command(author, version, about = "cartsync CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect remote lists
    Lists {
        #[command(subcommand)]
        action: ListsAction,
    },
}

#[derive(Subcommand)]
enum ListsAction {
    /// Print an owner's stored lists as JSON
    Show {
        /// Owner ID (UUID)
        #[arg(short, long)]
        owner: OwnerId,

        /// List kind (`cart` or `wishlist`); both when omitted
        #[arg(short, long)]
        kind: Option<ListKind>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Lists { action } => match action {
            ListsAction::Show { owner, kind } => commands::lists::show(owner, kind).await?,
        },
    }
    Ok(())
}
