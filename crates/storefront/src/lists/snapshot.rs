//! Local snapshot store: an anonymous visitor's list, kept in a per-visitor slot.
//!
//! The slot holds the list as a JSON array of `{"id", "quantity"}` objects
//! under the list's storage key. Writes overwrite the whole value. Reads
//! never fail: a missing slot is an empty list, and so is a slot that
//! cannot be decoded (logged at `warn`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tower_sessions::Session;

use cartsync_core::{LineItem, LineItems, ListKind};

use super::error::{SlotError, SnapshotError};

/// A string key-value slot scoped to one visitor.
#[async_trait]
pub trait KeyValueSlot: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError>;
    async fn set(&self, key: &str, value: String) -> Result<(), SlotError>;
    async fn remove(&self, key: &str) -> Result<(), SlotError>;
}

/// Slot backed by the visitor's server-side session.
#[derive(Clone, Debug)]
pub struct SessionSlot {
    session: Session,
}

impl SessionSlot {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl KeyValueSlot for SessionSlot {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.session.get::<String>(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SlotError> {
        Ok(self.session.insert(key, value).await?)
    }

    async fn remove(&self, key: &str) -> Result<(), SlotError> {
        self.session.remove_value(key).await?;
        Ok(())
    }
}

/// Process-local slot. Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct MemorySlot {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_values<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> T {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut values)
    }
}

#[async_trait]
impl KeyValueSlot for MemorySlot {
    async fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.with_values(|values| values.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SlotError> {
        self.with_values(|values| values.insert(key.to_string(), value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SlotError> {
        self.with_values(|values| values.remove(key));
        Ok(())
    }
}

/// Persists one list kind for an anonymous visitor.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored list. Absent or unreadable snapshots read as empty.
    async fn load(&self) -> LineItems;

    /// Overwrite the stored list.
    async fn save(&self, items: &LineItems);

    /// Remove the stored list.
    async fn clear(&self);
}

/// [`SnapshotStore`] over any [`KeyValueSlot`], keyed by [`ListKind::storage_key`].
#[derive(Clone, Debug)]
pub struct LocalSnapshotStore<S> {
    slot: S,
    kind: ListKind,
}

impl<S: KeyValueSlot> LocalSnapshotStore<S> {
    #[must_use]
    pub const fn new(slot: S, kind: ListKind) -> Self {
        Self { slot, kind }
    }

    /// Read and decode the slot, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Slot` if the slot cannot be read and
    /// `SnapshotError::Corrupt` if it does not hold a JSON list of line items.
    pub async fn try_load(&self) -> Result<LineItems, SnapshotError> {
        let Some(raw) = self.slot.get(self.kind.storage_key()).await? else {
            return Ok(LineItems::new());
        };
        let lines: Vec<LineItem> = serde_json::from_str(&raw)?;
        Ok(LineItems::from_lines(self.kind, lines))
    }
}

#[async_trait]
impl<S: KeyValueSlot> SnapshotStore for LocalSnapshotStore<S> {
    async fn load(&self) -> LineItems {
        match self.try_load().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(list = %self.kind, error = %e, "Discarding unreadable local list");
                LineItems::new()
            }
        }
    }

    async fn save(&self, items: &LineItems) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(list = %self.kind, error = %e, "Failed to encode local list");
                return;
            }
        };
        if let Err(e) = self.slot.set(self.kind.storage_key(), raw).await {
            tracing::warn!(list = %self.kind, error = %e, "Failed to save local list");
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.slot.remove(self.kind.storage_key()).await {
            tracing::warn!(list = %self.kind, error = %e, "Failed to clear local list");
        }
    }
}
