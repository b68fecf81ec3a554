//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tower_sessions::Session;

use cartsync_core::ListKind;

use crate::config::StorefrontConfig;
use crate::db::PgListService;
use crate::lists::{ListStores, LocalSnapshotStore, RemoteListService, SessionSlot};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, configuration and the remote
/// list services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    cart: Arc<dyn RemoteListService>,
    wishlist: Arc<dyn RemoteListService>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let cart = Arc::new(PgListService::new(pool.clone(), ListKind::Cart));
        let wishlist = Arc::new(PgListService::new(pool.clone(), ListKind::Wishlist));
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool: Some(pool),
                cart,
                wishlist,
            }),
        }
    }

    /// Create application state over arbitrary remote list services, with no
    /// database pool.
    #[must_use]
    pub fn with_remote_services(
        config: StorefrontConfig,
        cart: Arc<dyn RemoteListService>,
        wishlist: Arc<dyn RemoteListService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool: None,
                cart,
                wishlist,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if the state has one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// The remote list service for `kind`.
    #[must_use]
    pub fn remote(&self, kind: ListKind) -> Arc<dyn RemoteListService> {
        match kind {
            ListKind::Cart => self.inner.cart.clone(),
            ListKind::Wishlist => self.inner.wishlist.clone(),
        }
    }

    /// Stores for one list of the visitor owning `session`.
    #[must_use]
    pub fn list_stores(&self, kind: ListKind, session: &Session) -> ListStores {
        let snapshot = LocalSnapshotStore::new(SessionSlot::new(session.clone()), kind);
        ListStores::new(
            Arc::new(snapshot),
            self.remote(kind),
            self.inner.config.lists.migration_policy,
        )
        .with_max_quantity(self.inner.config.lists.max_line_quantity)
    }
}
