//! Core types for cartsync.
//!
//! This module provides type-safe wrappers for the list domain.

pub mod id;
pub mod line_item;
pub mod list;
pub mod price;
pub mod quantity;
pub mod summary;

pub use id::*;
pub use line_item::{AddOutcome, LineItem, LineItems};
pub use list::{ListKind, ListOwner, RemoteListRow};
pub use price::{CurrencyCode, Price};
pub use quantity::Quantity;
pub use summary::{CartSummary, PROMO_WELCOME10, SummaryError};
