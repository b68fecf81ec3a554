//! cartsync storefront library.
//!
//! Cart and wishlist synchronization for a storefront: anonymous visitors'
//! lists live in their session, identified visitors' lists live in
//! `PostgreSQL`, and the two are reconciled when a visitor signs in.
//!
//! The [`lists`] module holds the synchronization logic and is usable on its
//! own; the rest of the crate serves it over a JSON API.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod lists;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::request_id::{request_id, request_id_middleware};
use crate::state::AppState;

/// All routes with request ID and tracing layers, before state and sessions.
pub fn app_router() -> Router<AppState> {
    routes::routes()
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request_id(request.headers()).unwrap_or("-"),
                )
            }),
        )
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// The complete application over `state` with the given session layer.
pub fn build_app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    app_router().layer(session_layer).with_state(state)
}
