//! The list controller: one visitor's cart or wishlist.
//!
//! Mutations are optimistic. The in-memory list changes first and the
//! backend is told afterwards; when the backend fails the change is kept,
//! the failure message is published on the error channel, and the error is
//! returned to the caller.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use cartsync_core::{AddOutcome, ItemId, LineItems, ListKind, ListOwner, OwnerId, Quantity};

use super::backend::{AnonymousBackend, IdentifiedBackend, ListBackend};
use super::error::{ListError, ServiceError};
use super::events::AuthEvent;
use super::reconcile::{MigrationPolicy, ReconcileOutcome, Reconciler};
use super::remote::RemoteListService;
use super::snapshot::SnapshotStore;

/// Stores a controller persists to.
///
/// `snapshot` and `remote` must both hold the controller's list kind.
#[derive(Clone)]
pub struct ListStores {
    pub snapshot: Arc<dyn SnapshotStore>,
    pub remote: Arc<dyn RemoteListService>,
    pub policy: MigrationPolicy,
    /// Largest quantity a cart line may reach through repeated adds.
    pub max_quantity: Quantity,
}

impl ListStores {
    #[must_use]
    pub fn new(
        snapshot: Arc<dyn SnapshotStore>,
        remote: Arc<dyn RemoteListService>,
        policy: MigrationPolicy,
    ) -> Self {
        Self {
            snapshot,
            remote,
            policy,
            max_quantity: Quantity::MAX,
        }
    }

    #[must_use]
    pub fn with_max_quantity(mut self, max_quantity: Quantity) -> Self {
        self.max_quantity = max_quantity;
        self
    }

    fn backend_for(&self, owner: ListOwner) -> Box<dyn ListBackend> {
        match owner {
            ListOwner::Anonymous => Box::new(AnonymousBackend::new(self.snapshot.clone())),
            ListOwner::Identified(owner_id) => {
                Box::new(IdentifiedBackend::new(owner_id, self.remote.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ListOp {
    Load,
    Sync,
    Add,
    Remove,
    UpdateQuantity,
    Clear,
}

impl ListOp {
    fn message(self, kind: ListKind) -> String {
        match self {
            Self::Load => format!("Failed to load {kind} items."),
            Self::Sync => format!("Failed to sync {kind} items."),
            Self::Add => format!("Failed to add item to {kind}."),
            Self::Remove => format!("Failed to remove item from {kind}."),
            Self::UpdateQuantity => format!("Failed to update {kind} quantity."),
            Self::Clear => format!("Failed to clear {kind}."),
        }
    }
}

/// Holds one list in memory and keeps its backend in step.
pub struct ListController {
    kind: ListKind,
    items: LineItems,
    backend: Box<dyn ListBackend>,
    stores: ListStores,
    errors: watch::Sender<Option<String>>,
    auth_events: Option<broadcast::Receiver<AuthEvent>>,
}

impl ListController {
    /// Create a controller for `owner` without reading its stored list.
    #[must_use]
    pub fn new(kind: ListKind, owner: ListOwner, stores: ListStores) -> Self {
        let (errors, _) = watch::channel(None);
        Self {
            kind,
            items: LineItems::new(),
            backend: stores.backend_for(owner),
            stores,
            errors,
            auth_events: None,
        }
    }

    /// Create an anonymous controller hydrated from the local snapshot.
    pub async fn anonymous(kind: ListKind, stores: ListStores) -> Self {
        let mut controller = Self::new(kind, ListOwner::Anonymous, stores);
        controller.items = controller.stores.snapshot.load().await;
        controller
    }

    /// Create a controller for `owner` and load its stored list.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if an identified owner's remote list cannot be
    /// fetched.
    pub async fn open(
        kind: ListKind,
        owner: ListOwner,
        stores: ListStores,
    ) -> Result<Self, ServiceError> {
        let mut controller = Self::new(kind, owner, stores);
        controller.items = controller.backend.load().await.inspect_err(|e| {
            tracing::error!(list = %kind, ?owner, error = %e, "{}", ListOp::Load.message(kind));
        })?;
        Ok(controller)
    }

    /// Re-read the list from the backend, replacing the in-memory items.
    ///
    /// # Errors
    ///
    /// Returns `ListError::Service` if the backend cannot be read; the
    /// in-memory items are kept.
    pub async fn reload(&mut self) -> Result<(), ListError> {
        let pending = self.apply_pending_events().await;
        let result = self.backend.load().await;
        match result {
            Ok(items) => {
                self.items = items;
                self.finish(ListOp::Load, Ok(()), pending)
            }
            Err(e) => self.finish(ListOp::Load, Err(e), pending),
        }
    }

    /// Subscribe to authentication transitions. Pending events are applied
    /// at the start of every operation, or explicitly with [`catch_up`](Self::catch_up).
    ///
    /// A transition that fails during an operation does not stop the
    /// operation: it runs against the new owner's backend, and the
    /// transition's message stays on the error channel unless the operation
    /// itself fails.
    pub fn attach(&mut self, events: broadcast::Receiver<AuthEvent>) {
        self.auth_events = Some(events);
    }

    /// Apply every pending authentication event.
    ///
    /// # Errors
    ///
    /// Returns the first transition error; later events are still applied.
    pub async fn catch_up(&mut self) -> Result<(), ListError> {
        let mut first_error = None;
        loop {
            let Some(events) = self.auth_events.as_mut() else {
                break;
            };
            let event = match events.try_recv() {
                Ok(event) => event,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(list = %self.kind, skipped, "Auth events lagged");
                    continue;
                }
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => break,
            };
            if let Err(e) = self.on_auth_event(&event).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Apply one authentication transition.
    ///
    /// Signing in reconciles the local snapshot into the owner's remote list
    /// and then reads the remote list. Signing out switches back to the
    /// local snapshot. Events for the current owner are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `ListError::Service` if reconciliation or the remote read
    /// fails. The controller is still switched to the new owner and keeps
    /// its previous items.
    #[tracing::instrument(skip(self), fields(list = %self.kind))]
    pub async fn on_auth_event(&mut self, event: &AuthEvent) -> Result<ReconcileOutcome, ListError> {
        match *event {
            AuthEvent::SignedIn(owner_id) => self.sign_in(owner_id).await,
            AuthEvent::SignedOut => {
                if self.owner() == ListOwner::Anonymous {
                    return Ok(ReconcileOutcome::Unchanged);
                }
                self.backend = self.stores.backend_for(ListOwner::Anonymous);
                self.items = self.stores.snapshot.load().await;
                self.errors.send_replace(None);
                tracing::info!(items = self.items.len(), "Switched to local list");
                Ok(ReconcileOutcome::Unchanged)
            }
        }
    }

    async fn sign_in(&mut self, owner_id: OwnerId) -> Result<ReconcileOutcome, ListError> {
        let owner = ListOwner::Identified(owner_id);
        if self.owner() == owner {
            return Ok(ReconcileOutcome::Unchanged);
        }

        let reconciler = Reconciler::new(
            self.kind,
            self.stores.snapshot.clone(),
            self.stores.remote.clone(),
            self.stores.policy,
        );
        let reconciled = reconciler.reconcile(owner_id).await;
        self.backend = self.stores.backend_for(owner);

        let outcome = match reconciled {
            Ok(outcome) => outcome,
            Err(e) => return self.settle(ListOp::Sync, Err(e)).map(|()| ReconcileOutcome::Unchanged),
        };

        match self.backend.load().await {
            Ok(items) => {
                self.items = items;
                self.settle(ListOp::Load, Ok(()))?;
                tracing::info!(%owner_id, items = self.items.len(), ?outcome, "Switched to remote list");
                Ok(outcome)
            }
            Err(e) => self
                .settle(ListOp::Load, Err(e))
                .map(|()| ReconcileOutcome::Unchanged),
        }
    }

    /// Add `quantity` of `item_id`. Wishlist entries ignore the quantity.
    ///
    /// A cart line never grows past the stores' `max_quantity`: the added
    /// quantity shrinks to the remaining headroom, and a full line is
    /// reported as [`AddOutcome::AlreadyPresent`] without a backend call.
    ///
    /// # Errors
    ///
    /// Returns `ListError::Service` if the backend write fails; the item
    /// stays in the in-memory list.
    #[tracing::instrument(skip(self), fields(list = %self.kind))]
    pub async fn add(&mut self, item_id: ItemId, quantity: Quantity) -> Result<AddOutcome, ListError> {
        let pending = self.apply_pending_events().await;
        let Some(quantity) = self.headroom(item_id, quantity) else {
            self.errors.send_replace(pending);
            return Ok(AddOutcome::AlreadyPresent);
        };
        let outcome = self.items.add(item_id, quantity, self.kind);
        if outcome == AddOutcome::AlreadyPresent {
            self.errors.send_replace(pending);
            return Ok(outcome);
        }
        let result = self.backend.added(item_id, quantity, &self.items).await;
        self.finish(ListOp::Add, result, pending)?;
        Ok(outcome)
    }

    /// The part of `quantity` that fits under the line cap, or `None` if the
    /// cart line is already full.
    fn headroom(&self, item_id: ItemId, quantity: Quantity) -> Option<Quantity> {
        if !self.kind.tracks_quantity() {
            return Some(quantity);
        }
        let max = self.stores.max_quantity;
        let existing = self.items.get(item_id).map_or(0, |line| line.quantity.get());
        Quantity::new(max.get().saturating_sub(existing)).map(|left| left.min(quantity))
    }

    /// Remove `item_id`. Returns whether it was present; removing an absent
    /// item does not reach the backend.
    ///
    /// # Errors
    ///
    /// Returns `ListError::Service` if the backend write fails; the item
    /// stays removed from the in-memory list.
    #[tracing::instrument(skip(self), fields(list = %self.kind))]
    pub async fn remove(&mut self, item_id: ItemId) -> Result<bool, ListError> {
        let pending = self.apply_pending_events().await;
        if !self.items.remove(item_id) {
            self.errors.send_replace(pending);
            return Ok(false);
        }
        let result = self.backend.removed(item_id, &self.items).await;
        self.finish(ListOp::Remove, result, pending)?;
        Ok(true)
    }

    /// Set the quantity of a cart line, clamped to `1..=max`.
    ///
    /// Returns the stored quantity, or `None` if the item is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ListError::QuantityNotTracked` for a wishlist and
    /// `ListError::Service` if the backend write fails.
    #[tracing::instrument(skip(self), fields(list = %self.kind))]
    pub async fn update_quantity(
        &mut self,
        item_id: ItemId,
        requested: i64,
        max: Quantity,
    ) -> Result<Option<Quantity>, ListError> {
        if !self.kind.tracks_quantity() {
            return Err(ListError::QuantityNotTracked(self.kind));
        }
        let pending = self.apply_pending_events().await;
        let quantity = Quantity::clamped(requested, max);
        if !self.items.set_quantity(item_id, quantity) {
            self.errors.send_replace(pending);
            return Ok(None);
        }
        let result = self.backend.quantity_set(item_id, quantity, &self.items).await;
        self.finish(ListOp::UpdateQuantity, result, pending)?;
        Ok(Some(quantity))
    }

    /// Remove every item.
    ///
    /// # Errors
    ///
    /// Returns `ListError::Service` if the backend write fails.
    #[tracing::instrument(skip(self), fields(list = %self.kind))]
    pub async fn clear(&mut self) -> Result<(), ListError> {
        let pending = self.apply_pending_events().await;
        self.items.clear();
        let result = self.backend.cleared().await;
        self.finish(ListOp::Clear, result, pending)
    }

    /// Run [`catch_up`](Self::catch_up) ahead of an operation. Returns the
    /// message of a failed transition, already logged and published.
    async fn apply_pending_events(&mut self) -> Option<String> {
        match self.catch_up().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(list = %self.kind, owner = ?self.owner(), error = %e, "Continuing after failed auth transition");
                self.last_error()
            }
        }
    }

    fn settle(&self, op: ListOp, result: Result<(), ServiceError>) -> Result<(), ListError> {
        self.finish(op, result, None)
    }

    /// Publish the outcome of `op`. On success the channel carries `pending`,
    /// the message of a transition that failed earlier in the same call.
    fn finish(
        &self,
        op: ListOp,
        result: Result<(), ServiceError>,
        pending: Option<String>,
    ) -> Result<(), ListError> {
        match result {
            Ok(()) => {
                self.errors.send_replace(pending);
                Ok(())
            }
            Err(e) => {
                let message = op.message(self.kind);
                tracing::error!(list = %self.kind, owner = ?self.owner(), error = %e, "{message}");
                self.errors.send_replace(Some(message));
                Err(e.into())
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ListKind {
        self.kind
    }

    #[must_use]
    pub fn owner(&self) -> ListOwner {
        self.backend.owner()
    }

    #[must_use]
    pub const fn items(&self) -> &LineItems {
        &self.items
    }

    /// Badge count: total quantity for a cart, number of entries for a wishlist.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.total_quantity()
    }

    #[must_use]
    pub fn contains(&self, item_id: ItemId) -> bool {
        self.items.contains(item_id)
    }

    /// Message of the most recent failed operation, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.errors.borrow().clone()
    }

    /// Watch the error channel.
    #[must_use]
    pub fn errors(&self) -> watch::Receiver<Option<String>> {
        self.errors.subscribe()
    }
}
