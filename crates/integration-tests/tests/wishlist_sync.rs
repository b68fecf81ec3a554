//! Wishlist synchronization scenarios.
//!
//! Wishlist entries are presence-only, so repeated adds and reconciliation
//! never raise a quantity above one.

use cartsync_core::{AddOutcome, ListKind};
use cartsync_integration_tests::{ListHarness, item, lines, owner, qty};
use cartsync_storefront::lists::{AuthEvent, ListError, MigrationPolicy, ReconcileOutcome};

#[tokio::test]
async fn test_repeated_add_keeps_one_entry() {
    let wishlist = ListHarness::new(ListKind::Wishlist);
    let alice = owner();
    let mut controller = wishlist.open(alice).await;

    assert_eq!(
        controller.add(item(3), qty(1)).await.unwrap(),
        AddOutcome::Inserted
    );
    let calls = wishlist.remote.calls();
    assert_eq!(
        controller.add(item(3), qty(1)).await.unwrap(),
        AddOutcome::AlreadyPresent
    );

    assert_eq!(wishlist.remote.calls(), calls);
    assert_eq!(wishlist.remote_lines(alice), [(3, 1)]);
    assert_eq!(controller.count(), 1);
}

#[tokio::test]
async fn test_anonymous_wishlist_persists_across_page_loads() {
    let wishlist = ListHarness::new(ListKind::Wishlist);
    let mut first = wishlist.anonymous().await;
    first.add(item(1), qty(1)).await.unwrap();
    first.add(item(2), qty(1)).await.unwrap();

    let second = wishlist.anonymous().await;
    assert_eq!(lines(second.items()), [(1, 1), (2, 1)]);
    assert!(second.contains(item(2)));
}

#[tokio::test]
async fn test_sign_in_migrates_into_empty_remote() {
    let wishlist = ListHarness::new(ListKind::Wishlist);
    wishlist.seed_local(&[(1, 1), (2, 1)]).await;
    let alice = owner();

    let mut controller = wishlist.anonymous().await;
    let outcome = controller
        .on_auth_event(&AuthEvent::SignedIn(alice))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Migrated {
            inserted: 2,
            updated: 0
        }
    );
    assert_eq!(wishlist.remote_lines(alice), [(1, 1), (2, 1)]);
    assert!(wishlist.local().await.is_empty());
}

#[tokio::test]
async fn test_merge_skips_items_already_on_remote() {
    let wishlist = ListHarness::with_policy(ListKind::Wishlist, MigrationPolicy::MergeIntoRemote);
    wishlist.seed_local(&[(1, 1), (2, 1)]).await;
    let alice = owner();
    wishlist.seed_remote(alice, &[(2, 1)]);

    let mut controller = wishlist.anonymous().await;
    let outcome = controller
        .on_auth_event(&AuthEvent::SignedIn(alice))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Migrated {
            inserted: 1,
            updated: 0
        }
    );
    assert_eq!(wishlist.remote_lines(alice), [(2, 1), (1, 1)]);
    assert_eq!(lines(controller.items()), [(2, 1), (1, 1)]);
}

#[tokio::test]
async fn test_remove_deletes_the_owners_row() {
    let wishlist = ListHarness::new(ListKind::Wishlist);
    let alice = owner();
    let bob = owner();
    wishlist.seed_remote(alice, &[(4, 1), (5, 1)]);
    wishlist.seed_remote(bob, &[(4, 1)]);

    let mut controller = wishlist.open(alice).await;
    assert!(controller.remove(item(4)).await.unwrap());

    assert_eq!(wishlist.remote_lines(alice), [(5, 1)]);
    assert_eq!(wishlist.remote_lines(bob), [(4, 1)]);
}

#[tokio::test]
async fn test_quantity_update_is_rejected() {
    let wishlist = ListHarness::new(ListKind::Wishlist);
    let mut controller = wishlist.anonymous().await;
    controller.add(item(1), qty(1)).await.unwrap();

    let err = controller
        .update_quantity(item(1), 3, qty(10))
        .await
        .unwrap_err();

    assert!(matches!(err, ListError::QuantityNotTracked(ListKind::Wishlist)));
    assert_eq!(lines(controller.items()), [(1, 1)]);
}

#[tokio::test]
async fn test_failed_remove_reports_error() {
    let wishlist = ListHarness::new(ListKind::Wishlist);
    let alice = owner();
    wishlist.seed_remote(alice, &[(1, 1)]);
    let mut controller = wishlist.open(alice).await;
    wishlist.remote.fail_after(0);

    assert!(controller.remove(item(1)).await.is_err());

    assert!(!controller.contains(item(1)));
    assert_eq!(
        controller.last_error().as_deref(),
        Some("Failed to remove item from wishlist.")
    );

    wishlist.remote.heal();
    controller.reload().await.unwrap();
    assert!(controller.contains(item(1)));
    assert_eq!(controller.last_error(), None);
}
