//! Sign-in reconciliation of the local snapshot with the remote list.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cartsync_core::{ListKind, OwnerId};

use super::error::ServiceError;
use super::remote::RemoteListService;
use super::snapshot::SnapshotStore;

/// What to do with local items when the owner's remote list is not empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPolicy {
    /// The remote list wins; local items are dropped.
    #[default]
    DiscardLocal,
    /// Local items are merged into the remote list.
    #[serde(rename = "merge")]
    MergeIntoRemote,
}

pub const DEFAULT_MIGRATION_POLICY: MigrationPolicy = MigrationPolicy::DiscardLocal;

impl MigrationPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DiscardLocal => "discard-local",
            Self::MergeIntoRemote => "merge",
        }
    }
}

impl std::fmt::Display for MigrationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard-local" | "discard" => Ok(Self::DiscardLocal),
            "merge" | "merge-into-remote" => Ok(Self::MergeIntoRemote),
            other => Err(format!(
                "unknown migration policy '{other}' (expected 'discard-local' or 'merge')"
            )),
        }
    }
}

/// Result of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing local to migrate.
    Unchanged,
    /// The remote list was kept and `discarded` local items were dropped.
    RemoteKept { discarded: usize },
    /// Local items were written to the remote list.
    Migrated { inserted: usize, updated: usize },
}

/// Moves an anonymous visitor's local list into their remote list at sign-in.
pub struct Reconciler {
    kind: ListKind,
    snapshot: Arc<dyn SnapshotStore>,
    remote: Arc<dyn RemoteListService>,
    policy: MigrationPolicy,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        kind: ListKind,
        snapshot: Arc<dyn SnapshotStore>,
        remote: Arc<dyn RemoteListService>,
        policy: MigrationPolicy,
    ) -> Self {
        Self {
            kind,
            snapshot,
            remote,
            policy,
        }
    }

    /// Reconcile the local snapshot into `owner_id`'s remote list.
    ///
    /// The local snapshot is cleared only once every local item has been
    /// written (or deliberately discarded).
    ///
    /// # Errors
    ///
    /// Returns the first `ServiceError`. Rows written before the failure
    /// stay written and the local snapshot is left untouched.
    #[tracing::instrument(skip(self), fields(list = %self.kind, policy = %self.policy))]
    pub async fn reconcile(&self, owner_id: OwnerId) -> Result<ReconcileOutcome, ServiceError> {
        let local = self.snapshot.load().await;
        if local.is_empty() {
            return Ok(ReconcileOutcome::Unchanged);
        }

        let remote = self.remote.fetch_all(owner_id).await?;
        if !remote.is_empty() && self.policy == MigrationPolicy::DiscardLocal {
            self.snapshot.clear().await;
            tracing::info!(
                discarded = local.len(),
                remote = remote.len(),
                "Kept remote list, discarded local items"
            );
            return Ok(ReconcileOutcome::RemoteKept {
                discarded: local.len(),
            });
        }

        let mut inserted = 0;
        let mut updated = 0;
        for line in &local {
            match self.remote.find_by_item(owner_id, line.item_id).await? {
                None => {
                    self.remote
                        .insert(owner_id, line.item_id, line.quantity)
                        .await?;
                    inserted += 1;
                }
                Some(row) if self.kind.tracks_quantity() => {
                    self.remote
                        .update_quantity(row.row_id, row.quantity.saturating_add(line.quantity))
                        .await?;
                    updated += 1;
                }
                Some(_) => {}
            }
        }

        self.snapshot.clear().await;
        tracing::info!(inserted, updated, "Migrated local list to remote");
        Ok(ReconcileOutcome::Migrated { inserted, updated })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::lists::remote::InMemoryListService;
    use crate::lists::snapshot::{LocalSnapshotStore, MemorySlot};
    use cartsync_core::{ItemId, LineItems, Quantity};

    fn q(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    struct Fixture {
        snapshot: Arc<LocalSnapshotStore<MemorySlot>>,
        remote: Arc<InMemoryListService>,
        owner_id: OwnerId,
    }

    impl Fixture {
        async fn new(kind: ListKind, local: &[(i32, u32)]) -> Self {
            let snapshot = Arc::new(LocalSnapshotStore::new(MemorySlot::new(), kind));
            let mut items = LineItems::new();
            for &(id, n) in local {
                items.add(ItemId::new(id), q(n), kind);
            }
            snapshot.save(&items).await;
            Self {
                snapshot,
                remote: Arc::new(InMemoryListService::new(kind)),
                owner_id: OwnerId::new(Uuid::new_v4()),
            }
        }

        fn reconciler(&self, policy: MigrationPolicy) -> Reconciler {
            Reconciler::new(
                self.remote.kind(),
                self.snapshot.clone(),
                self.remote.clone(),
                policy,
            )
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "discard-local".parse::<MigrationPolicy>().unwrap(),
            MigrationPolicy::DiscardLocal
        );
        assert_eq!(
            " Merge ".parse::<MigrationPolicy>().unwrap(),
            MigrationPolicy::MergeIntoRemote
        );
        assert!("keep-both".parse::<MigrationPolicy>().is_err());
        assert_eq!(MigrationPolicy::default(), DEFAULT_MIGRATION_POLICY);
    }

    #[tokio::test]
    async fn test_empty_local_touches_nothing() {
        let f = Fixture::new(ListKind::Cart, &[]).await;
        let outcome = f
            .reconciler(MigrationPolicy::DiscardLocal)
            .reconcile(f.owner_id)
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unchanged);
        assert_eq!(f.remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_migrates_into_empty_remote() {
        let f = Fixture::new(ListKind::Cart, &[(1, 2), (2, 1)]).await;
        let outcome = f
            .reconciler(MigrationPolicy::DiscardLocal)
            .reconcile(f.owner_id)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Migrated {
                inserted: 2,
                updated: 0
            }
        );
        assert_eq!(f.remote.rows(f.owner_id).len(), 2);
        assert!(f.snapshot.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_discard_local_keeps_remote() {
        let f = Fixture::new(ListKind::Cart, &[(1, 2)]).await;
        f.remote.seed(f.owner_id, ItemId::new(9), q(1));

        let outcome = f
            .reconciler(MigrationPolicy::DiscardLocal)
            .reconcile(f.owner_id)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::RemoteKept { discarded: 1 });
        let rows = f.remote.rows(f.owner_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, ItemId::new(9));
        assert!(f.snapshot.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_merge_sums_cart_quantities() {
        let f = Fixture::new(ListKind::Cart, &[(1, 2), (3, 1)]).await;
        f.remote.seed(f.owner_id, ItemId::new(1), q(4));

        let outcome = f
            .reconciler(MigrationPolicy::MergeIntoRemote)
            .reconcile(f.owner_id)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Migrated {
                inserted: 1,
                updated: 1
            }
        );
        let rows = f.remote.rows(f.owner_id);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity, q(6));
    }

    #[tokio::test]
    async fn test_merge_wishlist_skips_present_items() {
        let f = Fixture::new(ListKind::Wishlist, &[(1, 1), (2, 1)]).await;
        f.remote.seed(f.owner_id, ItemId::new(1), Quantity::ONE);

        let outcome = f
            .reconciler(MigrationPolicy::MergeIntoRemote)
            .reconcile(f.owner_id)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Migrated {
                inserted: 1,
                updated: 0
            }
        );
        assert_eq!(f.remote.rows(f.owner_id).len(), 2);
    }

    #[tokio::test]
    async fn test_failure_keeps_written_rows_and_local_snapshot() {
        let f = Fixture::new(ListKind::Cart, &[(1, 1), (2, 1), (3, 1)]).await;
        // fetch_all, then find + insert for the first item only.
        f.remote.fail_after(3);

        let err = f
            .reconciler(MigrationPolicy::DiscardLocal)
            .reconcile(f.owner_id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert_eq!(f.remote.rows(f.owner_id).len(), 1);
        assert_eq!(f.snapshot.load().await.len(), 3);

        // Retrying after recovery finishes the remainder without duplicates.
        f.remote.heal();
        let outcome = f
            .reconciler(MigrationPolicy::MergeIntoRemote)
            .reconcile(f.owner_id)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Migrated {
                inserted: 2,
                updated: 1
            }
        );
        assert_eq!(f.remote.rows(f.owner_id).len(), 3);
    }
}
