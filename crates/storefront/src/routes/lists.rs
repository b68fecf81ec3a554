//! Shared plumbing for the cart and wishlist handlers.
//!
//! Every request opens the controller for the session's owner, applies one
//! operation and answers with the resulting [`ListView`]. A remote write
//! that failed still answers with the optimistic view, status 502 and the
//! failure message in `error`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use cartsync_core::{ItemId, LineItems, ListKind, ListOwner};

use crate::error::{AppError, Result};
use crate::lists::{ListController, ListError};
use crate::state::AppState;

/// A list as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListView {
    pub kind: ListKind,
    pub owner: ListOwner,
    pub items: LineItems,
    pub count: u64,
    pub error: Option<String>,
}

impl ListView {
    #[must_use]
    pub fn of(controller: &ListController) -> Self {
        Self {
            kind: controller.kind(),
            owner: controller.owner(),
            items: controller.items().clone(),
            count: controller.count(),
            error: controller.last_error(),
        }
    }
}

/// Body naming a single item.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub item_id: ItemId,
}

/// Open the `kind` list for the visitor owning `session`.
///
/// # Errors
///
/// Returns `AppError::Service` if an identified owner's remote list cannot
/// be read.
pub async fn open(
    state: &AppState,
    session: &Session,
    owner: ListOwner,
    kind: ListKind,
) -> Result<ListController> {
    let stores = state.list_stores(kind, session);
    Ok(ListController::open(kind, owner, stores).await?)
}

/// Answer with the controller's view after an operation.
///
/// # Errors
///
/// Returns `AppError::Lists` for errors other than a failed remote write.
pub fn respond<T>(controller: &ListController, result: std::result::Result<T, ListError>) -> Result<Response> {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(ListError::Service(_)) => StatusCode::BAD_GATEWAY,
        Err(e) => return Err(AppError::from(e)),
    };
    Ok((status, Json(ListView::of(controller))).into_response())
}
