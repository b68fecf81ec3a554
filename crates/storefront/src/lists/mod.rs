//! Cart and wishlist synchronization.
//!
//! An anonymous visitor's lists live in a per-visitor slot (the session, in
//! the HTTP deployment). Once the visitor signs in, their lists live in the
//! remote list tables keyed by owner, and whatever they collected while
//! anonymous is reconciled into them.
//!
//! - [`snapshot`] - local slot storage
//! - [`remote`] - the remote list service seam
//! - [`reconcile`] - sign-in migration of local items
//! - [`backend`] - persistence strategy per owner
//! - [`controller`] - the in-memory list and its optimistic mutations
//! - [`events`] - authentication transitions

pub mod backend;
pub mod controller;
pub mod error;
pub mod events;
pub mod reconcile;
pub mod remote;
pub mod snapshot;

pub use backend::{AnonymousBackend, IdentifiedBackend, ListBackend};
pub use controller::{ListController, ListStores};
pub use error::{ListError, ServiceError, SlotError, SnapshotError};
pub use events::{AuthEvent, AuthEvents};
pub use reconcile::{DEFAULT_MIGRATION_POLICY, MigrationPolicy, ReconcileOutcome, Reconciler};
pub use remote::{InMemoryListService, RemoteListService};
pub use snapshot::{KeyValueSlot, LocalSnapshotStore, MemorySlot, SessionSlot, SnapshotStore};
