//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `cartsync_storefront`
//!
//! Holds the server-side copy of identified visitors' lists:
//!
//! ## Tables
//!
//! - `storefront.cart_item` - Cart lines, one row per `(owner_id, item_id)`
//! - `storefront.wishlist_item` - Wishlist entries, one row per `(owner_id, item_id)`
//! - `tower_sessions.session` - Tower-sessions storage (anonymous list snapshots live here)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cartsync-cli -- migrate
//! ```

pub mod list_items;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use list_items::PgListService;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
