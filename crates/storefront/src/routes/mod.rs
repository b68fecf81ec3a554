//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (database)
//!
//! # Cart
//! GET  /api/cart                     - Cart view
//! POST /api/cart/add                 - Add item {item_id, quantity?}
//! POST /api/cart/update              - Set quantity {item_id, quantity, max_quantity?}
//! POST /api/cart/remove              - Remove item {item_id}
//! POST /api/cart/clear               - Empty the cart
//! GET  /api/cart/count               - Badge count
//! POST /api/cart/summary             - Totals {prices, promo_code?}
//!
//! # Wishlist
//! GET  /api/wishlist                 - Wishlist view
//! POST /api/wishlist/add             - Add item {item_id}
//! POST /api/wishlist/remove          - Remove item {item_id}
//! POST /api/wishlist/clear           - Empty the wishlist
//! GET  /api/wishlist/contains/{id}   - Membership check
//!
//! # Authentication hook
//! POST /api/session/sign-in          - Visitor signed in {owner_id} (x-auth-hook-token)
//! POST /api/session/sign-out         - Visitor signed out
//! ```

pub mod cart;
pub mod health;
pub mod lists;
pub mod session;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub use lists::ListView;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
        .route("/summary", post(cart::summary))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/clear", post(wishlist::clear))
        .route("/contains/{item_id}", get(wishlist::contains))
}

/// Create the authentication hook routes router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(session::sign_in))
        .route("/sign-out", post(session::sign_out))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/session", session_routes())
}
