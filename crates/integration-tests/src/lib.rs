//! Integration tests for cartsync.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (in-memory list services and sessions)
//! cargo test -p cartsync-integration-tests
//!
//! # Tests against a running storefront and database
//! cargo test -p cartsync-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` / `wishlist_sync` - list controller scenarios
//! - `http_api` - the JSON API driven in-process through `tower::ServiceExt`
//! - `running_server` - the JSON API of a live server (ignored by default)

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use uuid::Uuid;

use cartsync_core::{ItemId, LineItems, ListKind, ListOwner, OwnerId, Quantity};
use cartsync_storefront::config::{ListsConfig, StorefrontConfig};
use cartsync_storefront::lists::{
    InMemoryListService, ListController, ListStores, LocalSnapshotStore, MemorySlot,
    MigrationPolicy, SnapshotStore,
};
use cartsync_storefront::middleware::with_session_cookie;
use cartsync_storefront::state::AppState;

/// Hook token accepted by [`test_config`].
pub const TEST_HOOK_SECRET: &str = "k9$Qv2!xLm7#Tz4@Rw8^Pb3&Yn6*Hd1%";

/// A fresh owner identity.
#[must_use]
pub fn owner() -> OwnerId {
    OwnerId::new(Uuid::new_v4())
}

#[must_use]
pub const fn item(id: i32) -> ItemId {
    ItemId::new(id)
}

#[must_use]
pub fn qty(n: u32) -> Quantity {
    Quantity::new(n).unwrap()
}

/// One visitor's list of one kind: a local slot and a remote service that
/// outlive any single controller.
pub struct ListHarness {
    pub kind: ListKind,
    pub slot: MemorySlot,
    pub remote: Arc<InMemoryListService>,
    pub policy: MigrationPolicy,
}

impl ListHarness {
    #[must_use]
    pub fn new(kind: ListKind) -> Self {
        Self::with_policy(kind, MigrationPolicy::DiscardLocal)
    }

    #[must_use]
    pub fn with_policy(kind: ListKind, policy: MigrationPolicy) -> Self {
        Self {
            kind,
            slot: MemorySlot::new(),
            remote: Arc::new(InMemoryListService::new(kind)),
            policy,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> LocalSnapshotStore<MemorySlot> {
        LocalSnapshotStore::new(self.slot.clone(), self.kind)
    }

    #[must_use]
    pub fn stores(&self) -> ListStores {
        ListStores::new(Arc::new(self.snapshot()), self.remote.clone(), self.policy)
    }

    /// Write `lines` into the local slot as an anonymous visitor would have.
    pub async fn seed_local(&self, lines: &[(i32, u32)]) {
        let mut items = LineItems::new();
        for &(id, n) in lines {
            items.add(item(id), qty(n), self.kind);
        }
        self.snapshot().save(&items).await;
    }

    /// Store remote rows for `owner_id` directly.
    pub fn seed_remote(&self, owner_id: OwnerId, lines: &[(i32, u32)]) {
        for &(id, n) in lines {
            self.remote.seed(owner_id, item(id), qty(n));
        }
    }

    pub async fn local(&self) -> LineItems {
        self.snapshot().load().await
    }

    /// Remote rows for `owner_id` as `(item, quantity)` pairs, oldest first.
    #[must_use]
    pub fn remote_lines(&self, owner_id: OwnerId) -> Vec<(i32, u32)> {
        self.remote
            .rows(owner_id)
            .iter()
            .map(|row| (row.item_id.as_i32(), row.quantity.get()))
            .collect()
    }

    pub async fn anonymous(&self) -> ListController {
        ListController::anonymous(self.kind, self.stores()).await
    }

    pub async fn open(&self, owner_id: OwnerId) -> ListController {
        ListController::open(self.kind, ListOwner::Identified(owner_id), self.stores())
            .await
            .unwrap()
    }
}

/// `(item, quantity)` pairs of a list, in order.
#[must_use]
pub fn lines(items: &LineItems) -> Vec<(i32, u32)> {
    items
        .iter()
        .map(|line| (line.item_id.as_i32(), line.quantity.get()))
        .collect()
}

/// Configuration for in-process servers.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/cartsync_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        auth_hook_secret: SecretString::from(TEST_HOOK_SECRET),
        lists: ListsConfig {
            migration_policy: MigrationPolicy::DiscardLocal,
            max_line_quantity: qty(10),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// The storefront app over in-memory list services and sessions, with one
/// visitor's cookie jar.
pub struct TestApp {
    router: Router,
    pub cart: Arc<InMemoryListService>,
    pub wishlist: Arc<InMemoryListService>,
    cookie: Option<String>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = test_config();
        let cart = Arc::new(InMemoryListService::new(ListKind::Cart));
        let wishlist = Arc::new(InMemoryListService::new(ListKind::Wishlist));
        let state = AppState::with_remote_services(config.clone(), cart.clone(), wishlist.clone());
        let session_layer =
            with_session_cookie(SessionManagerLayer::new(MemoryStore::default()), &config);

        Self {
            router: cartsync_storefront::build_app(state, session_layer),
            cart,
            wishlist,
            cookie: None,
        }
    }

    /// Forget the session cookie, as a new browser would.
    pub fn new_visitor(&mut self) {
        self.cookie = None;
    }

    pub async fn get(&mut self, path: &str) -> (StatusCode, Value) {
        let request = Request::get(path);
        self.send(request, Body::empty()).await
    }

    pub async fn post(&mut self, path: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        self.send(request, Body::from(body.to_string())).await
    }

    /// Report a sign-in through the authentication hook.
    pub async fn sign_in(&mut self, owner_id: OwnerId) -> (StatusCode, Value) {
        let request = Request::post("/api/session/sign-in")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-auth-hook-token", TEST_HOOK_SECRET);
        let body = serde_json::json!({ "owner_id": owner_id });
        self.send(request, Body::from(body.to_string())).await
    }

    pub async fn sign_out(&mut self) -> (StatusCode, Value) {
        self.post("/api/session/sign-out", &Value::Null).await
    }

    /// Send a request with the visitor's cookie and keep any new cookie.
    pub async fn send(
        &mut self,
        mut request: axum::http::request::Builder,
        body: Body,
    ) -> (StatusCode, Value) {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// `(id, quantity)` pairs from a JSON list view.
#[must_use]
pub fn view_lines(view: &Value) -> Vec<(i64, i64)> {
    view["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| (line["id"].as_i64().unwrap(), line["quantity"].as_i64().unwrap()))
        .collect()
}
