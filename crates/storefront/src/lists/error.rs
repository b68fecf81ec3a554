//! Error types for list synchronization.

use thiserror::Error;

use cartsync_core::{ItemId, ListKind, OwnerId, RowId};

use crate::db::RepositoryError;

/// Errors from a remote list service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not be reached or refused the call.
    #[error("list service unavailable: {0}")]
    Unavailable(String),

    /// A row for this owner and item already exists.
    #[error("owner {owner_id} already has a row for item {item_id}")]
    Duplicate { owner_id: OwnerId, item_id: ItemId },

    /// No row with this id exists.
    #[error("list row {0} not found")]
    RowNotFound(RowId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors returned by [`ListController`](super::ListController) operations.
#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Quantities can only be changed on lists that track them.
    #[error("{0} entries do not carry a quantity")]
    QuantityNotTracked(ListKind),
}

/// Errors reading or writing a visitor's key-value slot.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Errors decoding a stored snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),

    /// The slot holds something other than a JSON list of line items.
    #[error("stored list is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
