//! Wishlist route handlers.
//!
//! Wishlist entries are presence-only: adding an item twice keeps one entry.

use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use cartsync_core::{ItemId, ListKind, Quantity};

use super::lists::{ItemRequest, ListView, open, respond};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::SessionOwner;
use crate::state::AppState;

/// Whether an item is on the wishlist.
#[derive(Debug, Serialize, Deserialize)]
pub struct WishlistContains {
    pub item_id: ItemId,
    pub contains: bool,
}

#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
) -> Result<Json<ListView>> {
    let wishlist = open(&state, &session, owner, ListKind::Wishlist).await?;
    Ok(Json(ListView::of(&wishlist)))
}

#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Json(request): Json<ItemRequest>,
) -> Result<Response> {
    let mut wishlist = open(&state, &session, owner, ListKind::Wishlist).await?;
    let result = wishlist.add(request.item_id, Quantity::ONE).await;

    add_breadcrumb(
        "wishlist",
        "Added item",
        Some(&[("item_id", &request.item_id.to_string())]),
    );
    respond(&wishlist, result)
}

#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Json(request): Json<ItemRequest>,
) -> Result<Response> {
    let mut wishlist = open(&state, &session, owner, ListKind::Wishlist).await?;
    let result = wishlist.remove(request.item_id).await;
    respond(&wishlist, result)
}

#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
) -> Result<Response> {
    let mut wishlist = open(&state, &session, owner, ListKind::Wishlist).await?;
    let result = wishlist.clear().await;
    respond(&wishlist, result)
}

/// Check a single item, e.g. to fill in a heart icon.
#[instrument(skip(state, session))]
pub async fn contains(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Path(item_id): Path<ItemId>,
) -> Result<Json<WishlistContains>> {
    let wishlist = open(&state, &session, owner, ListKind::Wishlist).await?;
    Ok(Json(WishlistContains {
        item_id,
        contains: wishlist.contains(item_id),
    }))
}
