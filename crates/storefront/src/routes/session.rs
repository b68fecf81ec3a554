//! Authentication hook routes.
//!
//! The external authentication service calls these when a visitor signs in
//! or out. Each call publishes the transition to both of the visitor's list
//! controllers: sign-in reconciles the session's anonymous lists into the
//! owner's remote lists, sign-out switches back to the session's lists.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use cartsync_core::{ListKind, ListOwner, OwnerId};

use super::lists::ListView;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::lists::{AuthEvents, ListController, ListError};
use crate::middleware::{AuthHook, SessionOwner, clear_current_owner, set_current_owner};
use crate::state::AppState;

/// Sign-in notification.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub owner_id: OwnerId,
}

/// Both lists after a transition.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub owner: ListOwner,
    pub cart: ListView,
    pub wishlist: ListView,
}

/// Controllers for both lists, subscribed to one event bus.
struct VisitorLists {
    events: AuthEvents,
    controllers: Vec<ListController>,
}

impl VisitorLists {
    fn new(controllers: Vec<ListController>) -> Self {
        let events = AuthEvents::new();
        let controllers = controllers
            .into_iter()
            .map(|mut controller| {
                controller.attach(events.subscribe());
                controller
            })
            .collect();
        Self {
            events,
            controllers,
        }
    }

    /// Apply published events to every controller. Returns the first failure.
    async fn catch_up(&mut self) -> Option<ListError> {
        let mut first_error = None;
        for controller in &mut self.controllers {
            if let Err(e) = controller.catch_up().await {
                first_error.get_or_insert(e);
            }
        }
        first_error
    }

    fn view(&self, owner: ListOwner, failed: bool) -> Response {
        let find = |kind| {
            self.controllers
                .iter()
                .find(|c| c.kind() == kind)
                .map(ListView::of)
        };
        let (Some(cart), Some(wishlist)) = (find(ListKind::Cart), find(ListKind::Wishlist)) else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let status = if failed {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::OK
        };
        (
            status,
            Json(SessionView {
                owner,
                cart,
                wishlist,
            }),
        )
            .into_response()
    }
}

/// Record a sign-in and reconcile the visitor's lists.
///
/// A failed reconciliation still signs the visitor in; the response is 502
/// and each list's `error` says what failed.
#[instrument(skip(state, session, _hook))]
pub async fn sign_in(
    State(state): State<AppState>,
    _hook: AuthHook,
    session: Session,
    SessionOwner(current): SessionOwner,
    Json(request): Json<SignInRequest>,
) -> Result<Response> {
    let mut controllers = Vec::with_capacity(ListKind::ALL.len());
    for kind in ListKind::ALL {
        let stores = state.list_stores(kind, &session);
        controllers.push(ListController::open(kind, current, stores).await?);
    }
    let mut lists = VisitorLists::new(controllers);

    lists.events.signed_in(request.owner_id);
    let failure = lists.catch_up().await;

    let owner = ListOwner::Identified(request.owner_id);
    set_current_owner(&session, owner).await?;
    set_sentry_user(&request.owner_id);

    if let Some(e) = &failure {
        tracing::error!(owner_id = %request.owner_id, error = %e, "List reconciliation failed at sign-in");
    } else {
        tracing::info!(owner_id = %request.owner_id, "Visitor signed in");
    }
    Ok(lists.view(owner, failure.is_some()))
}

/// Record a sign-out. The visitor's lists revert to what the session holds.
#[instrument(skip(state, session))]
pub async fn sign_out(
    State(state): State<AppState>,
    session: Session,
    SessionOwner(current): SessionOwner,
) -> Result<Response> {
    let mut controllers = Vec::with_capacity(ListKind::ALL.len());
    for kind in ListKind::ALL {
        let stores = state.list_stores(kind, &session);
        // The remote list is about to be dropped, so it is not read.
        controllers.push(match current {
            ListOwner::Anonymous => ListController::anonymous(kind, stores).await,
            ListOwner::Identified(_) => ListController::new(kind, current, stores),
        });
    }
    let mut lists = VisitorLists::new(controllers);

    lists.events.signed_out();
    let failure = lists.catch_up().await;

    clear_current_owner(&session).await?;
    clear_sentry_user();
    tracing::info!(was = ?current, "Visitor signed out");

    Ok(lists.view(ListOwner::Anonymous, failure.is_some()))
}
