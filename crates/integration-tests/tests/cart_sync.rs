//! Cart synchronization scenarios.
//!
//! Each test drives list controllers over a shared local slot and an
//! in-memory remote cart, the way a visitor's successive page loads would.

use cartsync_core::{AddOutcome, ListKind, ListOwner};
use cartsync_integration_tests::{ListHarness, item, lines, owner, qty};
use cartsync_storefront::lists::{
    AuthEvent, AuthEvents, ListController, ListError, MigrationPolicy, ReconcileOutcome,
    ServiceError,
};

// =============================================================================
// Uniqueness
// =============================================================================

#[tokio::test]
async fn test_repeated_adds_sum_into_one_line() {
    let cart = ListHarness::new(ListKind::Cart);
    let mut controller = cart.anonymous().await;

    assert_eq!(controller.add(item(1), qty(2)).await.unwrap(), AddOutcome::Inserted);
    controller.add(item(2), qty(1)).await.unwrap();
    assert_eq!(
        controller.add(item(1), qty(3)).await.unwrap(),
        AddOutcome::Incremented
    );

    assert_eq!(lines(controller.items()), [(1, 5), (2, 1)]);
    assert_eq!(lines(&cart.local().await), [(1, 5), (2, 1)]);
}

#[tokio::test]
async fn test_identified_adds_keep_one_row_per_item() {
    let cart = ListHarness::new(ListKind::Cart);
    let alice = owner();
    let mut controller = cart.open(alice).await;

    controller.add(item(7), qty(1)).await.unwrap();
    controller.add(item(7), qty(4)).await.unwrap();

    assert_eq!(cart.remote_lines(alice), [(7, 5)]);
    assert_eq!(lines(controller.items()), [(7, 5)]);
}

// =============================================================================
// Sign-in reconciliation
// =============================================================================

#[tokio::test]
async fn test_sign_in_migrates_local_cart_into_empty_remote() {
    let cart = ListHarness::new(ListKind::Cart);
    cart.seed_local(&[(1, 2), (2, 1)]).await;
    let alice = owner();

    let mut controller = cart.anonymous().await;
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
    assert_eq!(cart.remote_lines(alice), [(1, 2), (2, 1)]);
    assert!(cart.local().await.is_empty());
    assert_eq!(controller.owner(), ListOwner::Identified(alice));
    assert_eq!(lines(controller.items()), [(1, 2), (2, 1)]);
}

#[tokio::test]
async fn test_sign_in_keeps_non_empty_remote_and_discards_local() {
    let cart = ListHarness::new(ListKind::Cart);
    cart.seed_local(&[(1, 2)]).await;
    let alice = owner();
    cart.seed_remote(alice, &[(3, 1)]);

    let mut controller = cart.anonymous().await;
    let outcome = controller
        .on_auth_event(&AuthEvent::SignedIn(alice))
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::RemoteKept { discarded: 1 });
    assert_eq!(cart.remote_lines(alice), [(3, 1)]);
    assert!(cart.local().await.is_empty());
    assert_eq!(lines(controller.items()), [(3, 1)]);
}

#[tokio::test]
async fn test_merge_policy_sums_into_existing_rows() {
    let cart = ListHarness::with_policy(ListKind::Cart, MigrationPolicy::MergeIntoRemote);
    cart.seed_local(&[(1, 2), (4, 1)]).await;
    let alice = owner();
    cart.seed_remote(alice, &[(1, 3), (3, 1)]);

    let mut controller = cart.anonymous().await;
    controller
        .on_auth_event(&AuthEvent::SignedIn(alice))
        .await
        .unwrap();

    assert_eq!(cart.remote_lines(alice), [(1, 5), (3, 1), (4, 1)]);
    assert!(cart.local().await.is_empty());
}

#[tokio::test]
async fn test_failed_migration_keeps_written_rows_and_local_snapshot() {
    let cart = ListHarness::new(ListKind::Cart);
    cart.seed_local(&[(1, 1), (2, 1), (3, 1)]).await;
    let alice = owner();
    // fetch_all, then find + insert for item 1; the find for item 2 fails.
    cart.remote.fail_after(3);

    let mut controller = cart.anonymous().await;
    let err = controller
        .on_auth_event(&AuthEvent::SignedIn(alice))
        .await
        .unwrap_err();

    assert!(matches!(err, ListError::Service(ServiceError::Unavailable(_))));
    assert_eq!(cart.remote_lines(alice), [(1, 1)]);
    assert_eq!(cart.local().await.len(), 3);
    assert_eq!(controller.owner(), ListOwner::Identified(alice));
    assert_eq!(
        controller.last_error().as_deref(),
        Some("Failed to sync cart items.")
    );
}

#[tokio::test]
async fn test_event_bus_reconciles_before_the_next_operation() {
    let cart = ListHarness::new(ListKind::Cart);
    let events = AuthEvents::new();
    let mut controller = cart.anonymous().await;
    controller.attach(events.subscribe());
    controller.add(item(1), qty(2)).await.unwrap();

    let alice = owner();
    events.signed_in(alice);
    controller.add(item(2), qty(1)).await.unwrap();

    assert_eq!(cart.remote_lines(alice), [(1, 2), (2, 1)]);
    assert!(cart.local().await.is_empty());
}

#[tokio::test]
async fn test_add_after_failed_sign_in_is_kept() {
    let cart = ListHarness::new(ListKind::Cart);
    let events = AuthEvents::new();
    let mut controller = cart.anonymous().await;
    controller.attach(events.subscribe());
    controller.add(item(1), qty(1)).await.unwrap();
    cart.remote.fail_after(0);

    let alice = owner();
    events.signed_in(alice);
    assert!(controller.add(item(2), qty(1)).await.is_err());

    assert!(controller.contains(item(2)));
    assert_eq!(controller.owner(), ListOwner::Identified(alice));
    assert_eq!(
        controller.last_error().as_deref(),
        Some("Failed to add item to cart.")
    );
    // The local cart is still there for a later migration.
    assert_eq!(lines(&cart.local().await), [(1, 1)]);
}

#[tokio::test]
async fn test_add_lands_on_remote_when_sign_in_sync_fails_once() {
    let cart = ListHarness::new(ListKind::Cart);
    let events = AuthEvents::new();
    let mut controller = cart.anonymous().await;
    controller.attach(events.subscribe());
    controller.add(item(1), qty(1)).await.unwrap();
    cart.remote.fail_next(1);

    let alice = owner();
    events.signed_in(alice);
    controller.add(item(2), qty(3)).await.unwrap();

    assert_eq!(cart.remote_lines(alice), [(2, 3)]);
    assert_eq!(lines(controller.items()), [(1, 1), (2, 3)]);
    assert_eq!(
        controller.last_error().as_deref(),
        Some("Failed to sync cart items.")
    );
}

// =============================================================================
// Sign-out
// =============================================================================

#[tokio::test]
async fn test_sign_out_rehydrates_from_local_snapshot() {
    let cart = ListHarness::new(ListKind::Cart);
    let alice = owner();
    cart.seed_remote(alice, &[(5, 2)]);

    let mut controller = cart.open(alice).await;
    assert_eq!(lines(controller.items()), [(5, 2)]);

    // Something else wrote the slot while the visitor was signed in.
    cart.seed_local(&[(9, 1)]).await;
    controller.on_auth_event(&AuthEvent::SignedOut).await.unwrap();

    assert_eq!(controller.owner(), ListOwner::Anonymous);
    assert_eq!(lines(controller.items()), [(9, 1)]);
    // Nothing is copied down and the remote list is left alone.
    assert_eq!(cart.remote_lines(alice), [(5, 2)]);
}

#[tokio::test]
async fn test_sign_out_after_migration_shows_empty_cart() {
    let cart = ListHarness::new(ListKind::Cart);
    cart.seed_local(&[(1, 1)]).await;
    let alice = owner();

    let mut controller = cart.anonymous().await;
    controller
        .on_auth_event(&AuthEvent::SignedIn(alice))
        .await
        .unwrap();
    controller.on_auth_event(&AuthEvent::SignedOut).await.unwrap();

    assert!(controller.items().is_empty());
    assert_eq!(cart.remote_lines(alice), [(1, 1)]);
}

// =============================================================================
// Quantity, removal, clearing
// =============================================================================

#[tokio::test]
async fn test_update_quantity_clamps_to_bounds() {
    let cart = ListHarness::new(ListKind::Cart);
    let alice = owner();
    let mut controller = cart.open(alice).await;
    controller.add(item(1), qty(3)).await.unwrap();

    let max = qty(5);
    assert_eq!(
        controller.update_quantity(item(1), -4, max).await.unwrap(),
        Some(qty(1))
    );
    assert_eq!(cart.remote_lines(alice), [(1, 1)]);

    assert_eq!(
        controller.update_quantity(item(1), 12, max).await.unwrap(),
        Some(qty(5))
    );
    assert_eq!(cart.remote_lines(alice), [(1, 5)]);
}

#[tokio::test]
async fn test_repeated_adds_stop_at_line_cap() {
    let cart = ListHarness::new(ListKind::Cart);
    let alice = owner();
    let mut controller = ListController::open(
        ListKind::Cart,
        ListOwner::Identified(alice),
        cart.stores().with_max_quantity(qty(5)),
    )
    .await
    .unwrap();

    controller.add(item(1), qty(3)).await.unwrap();
    controller.add(item(1), qty(3)).await.unwrap();
    let calls = cart.remote.calls();
    assert_eq!(
        controller.add(item(1), qty(1)).await.unwrap(),
        AddOutcome::AlreadyPresent
    );

    assert_eq!(cart.remote.calls(), calls);
    assert_eq!(cart.remote_lines(alice), [(1, 5)]);
    assert_eq!(lines(controller.items()), [(1, 5)]);
}

#[tokio::test]
async fn test_second_remove_is_a_no_op() {
    let cart = ListHarness::new(ListKind::Cart);
    let alice = owner();
    let mut controller = cart.open(alice).await;
    controller.add(item(1), qty(1)).await.unwrap();

    assert!(controller.remove(item(1)).await.unwrap());
    let calls = cart.remote.calls();
    assert!(!controller.remove(item(1)).await.unwrap());

    assert!(!controller.contains(item(1)));
    assert_eq!(cart.remote.calls(), calls);
    assert!(cart.remote_lines(alice).is_empty());
}

#[tokio::test]
async fn test_clear_empties_the_matching_store() {
    let cart = ListHarness::new(ListKind::Cart);
    let mut anonymous = cart.anonymous().await;
    anonymous.add(item(1), qty(1)).await.unwrap();
    anonymous.clear().await.unwrap();
    assert!(anonymous.items().is_empty());
    assert!(cart.local().await.is_empty());

    let alice = owner();
    let bob = owner();
    cart.seed_remote(alice, &[(1, 1), (2, 2)]);
    cart.seed_remote(bob, &[(1, 1)]);
    let mut identified = cart.open(alice).await;
    identified.clear().await.unwrap();

    assert!(identified.items().is_empty());
    assert!(cart.remote_lines(alice).is_empty());
    assert_eq!(cart.remote_lines(bob), [(1, 1)]);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_failed_add_keeps_optimistic_item() {
    let cart = ListHarness::new(ListKind::Cart);
    let alice = owner();
    let mut controller = cart.open(alice).await;
    let errors = controller.errors();
    cart.remote.fail_after(0);

    assert!(controller.add(item(1), qty(2)).await.is_err());

    assert_eq!(lines(controller.items()), [(1, 2)]);
    assert!(cart.remote_lines(alice).is_empty());
    assert_eq!(
        errors.borrow().as_deref(),
        Some("Failed to add item to cart.")
    );
}

#[tokio::test]
async fn test_open_fails_when_remote_is_down() {
    let cart = ListHarness::new(ListKind::Cart);
    cart.remote.fail_after(0);

    let result = ListController::open(
        ListKind::Cart,
        ListOwner::Identified(owner()),
        cart.stores(),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));
}
