//! List kinds, list ownership and the remote row shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ItemId, OwnerId, RowId};
use super::line_item::LineItem;
use super::quantity::Quantity;

/// Which list a line item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Cart,
    Wishlist,
}

impl ListKind {
    /// All list kinds, in the order they are reconciled at sign-in.
    pub const ALL: [Self; 2] = [Self::Cart, Self::Wishlist];

    /// Key of the visitor's local slot holding this list.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }

    /// Whether entries carry a quantity. Wishlist entries are presence-only.
    #[must_use]
    pub const fn tracks_quantity(self) -> bool {
        matches!(self, Self::Cart)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.storage_key()
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(Self::Cart),
            "wishlist" => Ok(Self::Wishlist),
            other => Err(format!("unknown list kind: {other}")),
        }
    }
}

/// Who a list belongs to, which also decides where it is persisted.
///
/// `Anonymous` lists live in the visitor's local slot; `Identified` lists
/// live in the remote table keyed by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "owner_id", rename_all = "snake_case")]
pub enum ListOwner {
    #[default]
    Anonymous,
    Identified(OwnerId),
}

impl ListOwner {
    #[must_use]
    pub const fn owner_id(&self) -> Option<OwnerId> {
        match self {
            Self::Anonymous => None,
            Self::Identified(id) => Some(*id),
        }
    }

    #[must_use]
    pub const fn is_identified(&self) -> bool {
        matches!(self, Self::Identified(_))
    }
}

impl From<Option<OwnerId>> for ListOwner {
    fn from(owner: Option<OwnerId>) -> Self {
        owner.map_or(Self::Anonymous, Self::Identified)
    }
}

/// Server-side persisted shape of one list entry.
///
/// `row_id` is generated by the service; update and delete are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteListRow {
    pub row_id: RowId,
    pub owner_id: OwnerId,
    pub item_id: ItemId,
    pub quantity: Quantity,
    pub inserted_at: DateTime<Utc>,
}

impl RemoteListRow {
    #[must_use]
    pub const fn to_line_item(&self) -> LineItem {
        LineItem::new(self.item_id, self.quantity)
    }
}
