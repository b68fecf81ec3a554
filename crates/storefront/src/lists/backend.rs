//! Persistence strategies behind a list controller.
//!
//! The controller mutates its in-memory items first and then tells the
//! backend what changed. An anonymous visitor's list is rewritten wholesale
//! into the local snapshot; an identified visitor's list is written row by
//! row to the remote service.

use std::sync::Arc;

use async_trait::async_trait;

use cartsync_core::{ItemId, LineItems, ListKind, ListOwner, OwnerId, Quantity};

use super::error::ServiceError;
use super::remote::RemoteListService;
use super::snapshot::SnapshotStore;

/// Where a list is persisted for its current owner.
#[async_trait]
pub trait ListBackend: Send + Sync {
    fn owner(&self) -> ListOwner;

    /// Read the persisted list.
    async fn load(&self) -> Result<LineItems, ServiceError>;

    /// `quantity` of `item_id` was added; `items` is the list after the add.
    async fn added(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        items: &LineItems,
    ) -> Result<(), ServiceError>;

    /// `item_id` was removed; `items` is the list after the removal.
    async fn removed(&self, item_id: ItemId, items: &LineItems) -> Result<(), ServiceError>;

    /// The quantity of `item_id` was set to `quantity`.
    async fn quantity_set(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        items: &LineItems,
    ) -> Result<(), ServiceError>;

    /// Every item was removed.
    async fn cleared(&self) -> Result<(), ServiceError>;
}

/// Backend for anonymous visitors: the local snapshot.
///
/// Snapshot writes never fail, so neither does this backend.
pub struct AnonymousBackend {
    snapshot: Arc<dyn SnapshotStore>,
}

impl AnonymousBackend {
    #[must_use]
    pub fn new(snapshot: Arc<dyn SnapshotStore>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ListBackend for AnonymousBackend {
    fn owner(&self) -> ListOwner {
        ListOwner::Anonymous
    }

    async fn load(&self) -> Result<LineItems, ServiceError> {
        Ok(self.snapshot.load().await)
    }

    async fn added(&self, _: ItemId, _: Quantity, items: &LineItems) -> Result<(), ServiceError> {
        self.snapshot.save(items).await;
        Ok(())
    }

    async fn removed(&self, _: ItemId, items: &LineItems) -> Result<(), ServiceError> {
        self.snapshot.save(items).await;
        Ok(())
    }

    async fn quantity_set(
        &self,
        _: ItemId,
        _: Quantity,
        items: &LineItems,
    ) -> Result<(), ServiceError> {
        self.snapshot.save(items).await;
        Ok(())
    }

    async fn cleared(&self) -> Result<(), ServiceError> {
        self.snapshot.clear().await;
        Ok(())
    }
}

/// Backend for identified visitors: the remote list service.
pub struct IdentifiedBackend {
    owner_id: OwnerId,
    remote: Arc<dyn RemoteListService>,
}

impl IdentifiedBackend {
    #[must_use]
    pub fn new(owner_id: OwnerId, remote: Arc<dyn RemoteListService>) -> Self {
        Self { owner_id, remote }
    }

    fn kind(&self) -> ListKind {
        self.remote.kind()
    }
}

#[async_trait]
impl ListBackend for IdentifiedBackend {
    fn owner(&self) -> ListOwner {
        ListOwner::Identified(self.owner_id)
    }

    async fn load(&self) -> Result<LineItems, ServiceError> {
        let rows = self.remote.fetch_all(self.owner_id).await?;
        Ok(LineItems::from_rows(self.kind(), &rows))
    }

    async fn added(&self, item_id: ItemId, quantity: Quantity, _: &LineItems) -> Result<(), ServiceError> {
        match self.remote.find_by_item(self.owner_id, item_id).await? {
            Some(row) if self.kind().tracks_quantity() => {
                self.remote
                    .update_quantity(row.row_id, row.quantity.saturating_add(quantity))
                    .await?;
            }
            Some(_) => {}
            None => {
                let quantity = if self.kind().tracks_quantity() {
                    quantity
                } else {
                    Quantity::ONE
                };
                self.remote.insert(self.owner_id, item_id, quantity).await?;
            }
        }
        Ok(())
    }

    async fn removed(&self, item_id: ItemId, _: &LineItems) -> Result<(), ServiceError> {
        if self.kind().tracks_quantity() {
            return self
                .remote
                .delete_by_owner_and_item(self.owner_id, item_id)
                .await;
        }
        if let Some(row) = self.remote.find_by_item(self.owner_id, item_id).await? {
            self.remote.delete_by_row(row.row_id).await?;
        }
        Ok(())
    }

    async fn quantity_set(
        &self,
        item_id: ItemId,
        quantity: Quantity,
        _: &LineItems,
    ) -> Result<(), ServiceError> {
        match self.remote.find_by_item(self.owner_id, item_id).await? {
            Some(row) => {
                self.remote.update_quantity(row.row_id, quantity).await?;
            }
            None => {
                self.remote.insert(self.owner_id, item_id, quantity).await?;
            }
        }
        Ok(())
    }

    async fn cleared(&self) -> Result<(), ServiceError> {
        self.remote.delete_all_for_owner(self.owner_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::lists::remote::InMemoryListService;
    use crate::lists::snapshot::{LocalSnapshotStore, MemorySlot};

    fn q(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn identified(kind: ListKind) -> (Arc<InMemoryListService>, IdentifiedBackend, OwnerId) {
        let remote = Arc::new(InMemoryListService::new(kind));
        let owner_id = OwnerId::new(Uuid::new_v4());
        let backend = IdentifiedBackend::new(owner_id, remote.clone());
        (remote, backend, owner_id)
    }

    #[tokio::test]
    async fn test_anonymous_backend_writes_snapshot() {
        let snapshot = Arc::new(LocalSnapshotStore::new(MemorySlot::new(), ListKind::Cart));
        let backend = AnonymousBackend::new(snapshot.clone());

        let mut items = LineItems::new();
        items.add(ItemId::new(1), q(2), ListKind::Cart);
        backend.added(ItemId::new(1), q(2), &items).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), items);

        backend.cleared().await.unwrap();
        assert!(snapshot.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_add_increments_existing_row() {
        let (remote, backend, owner_id) = identified(ListKind::Cart);
        let item = ItemId::new(5);

        backend.added(item, q(2), &LineItems::new()).await.unwrap();
        backend.added(item, q(3), &LineItems::new()).await.unwrap();

        let rows = remote.rows(owner_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, q(5));
    }

    #[tokio::test]
    async fn test_wishlist_add_is_presence_only() {
        let (remote, backend, owner_id) = identified(ListKind::Wishlist);
        let item = ItemId::new(5);

        backend.added(item, q(4), &LineItems::new()).await.unwrap();
        backend.added(item, q(1), &LineItems::new()).await.unwrap();

        let rows = remote.rows(owner_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, Quantity::ONE);
    }

    #[tokio::test]
    async fn test_remove_paths() {
        let (cart, cart_backend, alice) = identified(ListKind::Cart);
        cart.seed(alice, ItemId::new(1), q(2));
        cart_backend.removed(ItemId::new(1), &LineItems::new()).await.unwrap();
        assert!(cart.rows(alice).is_empty());
        // Direct delete: a single call.
        assert_eq!(cart.calls(), 1);

        let (wishlist, wishlist_backend, bob) = identified(ListKind::Wishlist);
        wishlist.seed(bob, ItemId::new(1), Quantity::ONE);
        wishlist_backend
            .removed(ItemId::new(1), &LineItems::new())
            .await
            .unwrap();
        assert!(wishlist.rows(bob).is_empty());
        // Find then delete by row.
        assert_eq!(wishlist.calls(), 2);
    }

    #[tokio::test]
    async fn test_quantity_set_inserts_when_row_missing() {
        let (remote, backend, owner_id) = identified(ListKind::Cart);
        backend
            .quantity_set(ItemId::new(2), q(7), &LineItems::new())
            .await
            .unwrap();
        backend
            .quantity_set(ItemId::new(2), q(3), &LineItems::new())
            .await
            .unwrap();

        let rows = remote.rows(owner_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, q(3));
    }

    #[tokio::test]
    async fn test_load_collapses_rows() {
        let (remote, backend, owner_id) = identified(ListKind::Cart);
        remote.seed(owner_id, ItemId::new(1), q(1));
        remote.seed(owner_id, ItemId::new(1), q(2));

        let items = backend.load().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.get(ItemId::new(1)).unwrap().quantity, q(3));
    }
}
