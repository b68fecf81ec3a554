//! Cart route handlers.
//!
//! Anonymous carts live in the session; identified carts live in the remote
//! cart table. See [`super::lists`] for the shared response shape.

use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use cartsync_core::{CartSummary, ItemId, ListKind, Price, Quantity};

use super::lists::{ItemRequest, ListView, open, respond};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::SessionOwner;
use crate::state::AppState;

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
    /// Defaults to 1; clamped to `1..=LIST_MAX_LINE_QUANTITY`.
    pub quantity: Option<i64>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub item_id: ItemId,
    pub quantity: i64,
    /// Per-item cap (e.g. stock on hand), clamped into `1..=` the configured maximum.
    pub max_quantity: Option<u32>,
}

/// Cart badge count.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartCount {
    pub count: u64,
}

/// Unit price for one cart item, supplied by the catalog.
#[derive(Debug, Deserialize)]
pub struct ItemPrice {
    pub item_id: ItemId,
    #[serde(flatten)]
    pub price: Price,
}

/// Cart totals request.
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub prices: Vec<ItemPrice>,
    pub promo_code: Option<String>,
}

/// Cart totals response.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub cart: ListView,
    pub summary: CartSummary,
}

/// Show the cart.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
) -> Result<Json<ListView>> {
    let cart = open(&state, &session, owner, ListKind::Cart).await?;
    Ok(Json(ListView::of(&cart)))
}

/// Add an item to the cart.
///
/// Adding an item already in the cart increases its quantity, never past
/// the configured line maximum.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Json(request): Json<AddToCartRequest>,
) -> Result<Response> {
    let max = state.config().lists.max_line_quantity;
    let quantity = request
        .quantity
        .map_or(Quantity::ONE, |requested| Quantity::clamped(requested, max));

    let mut cart = open(&state, &session, owner, ListKind::Cart).await?;
    let result = cart.add(request.item_id, quantity).await;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("item_id", &request.item_id.to_string())]),
    );
    respond(&cart, result)
}

/// Set the quantity of a cart line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Response> {
    let configured = state.config().lists.max_line_quantity;
    let max = request
        .max_quantity
        .map_or(configured, |cap| Quantity::clamped(i64::from(cap), configured));

    let mut cart = open(&state, &session, owner, ListKind::Cart).await?;
    let result = cart
        .update_quantity(request.item_id, request.quantity, max)
        .await;
    respond(&cart, result)
}

/// Remove an item from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Json(request): Json<ItemRequest>,
) -> Result<Response> {
    let mut cart = open(&state, &session, owner, ListKind::Cart).await?;
    let result = cart.remove(request.item_id).await;
    respond(&cart, result)
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
) -> Result<Response> {
    let mut cart = open(&state, &session, owner, ListKind::Cart).await?;
    let result = cart.clear().await;
    respond(&cart, result)
}

/// Cart badge count.
#[instrument(skip(state, session))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
) -> Result<Json<CartCount>> {
    let cart = open(&state, &session, owner, ListKind::Cart).await?;
    Ok(Json(CartCount {
        count: cart.count(),
    }))
}

/// Compute cart totals from catalog prices and an optional promo code.
#[instrument(skip(state, session, request))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(owner): SessionOwner,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>> {
    let cart = open(&state, &session, owner, ListKind::Cart).await?;

    let prices: HashMap<ItemId, Price> = request
        .prices
        .into_iter()
        .map(|p| (p.item_id, p.price))
        .collect();

    let mut lines = Vec::with_capacity(cart.items().len());
    for line in cart.items() {
        let price = prices
            .get(&line.item_id)
            .ok_or_else(|| AppError::BadRequest(format!("no price for item {}", line.item_id)))?;
        lines.push((*line, *price));
    }

    let summary = CartSummary::compute(&lines, request.promo_code.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(SummaryResponse {
        cart: ListView::of(&cart),
        summary,
    }))
}
