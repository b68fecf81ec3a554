//! Line items and the per-list collection that keeps them unique.

use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::list::{ListKind, RemoteListRow};
use super::quantity::Quantity;

/// One distinct product tracked in a cart or wishlist.
///
/// Serialized as `{"id": <item>, "quantity": <n>}`, the shape kept in the
/// visitor's local slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub item_id: ItemId,
    #[serde(default)]
    pub quantity: Quantity,
}

impl LineItem {
    #[must_use]
    pub const fn new(item_id: ItemId, quantity: Quantity) -> Self {
        Self { item_id, quantity }
    }
}

/// What [`LineItems::add`] did to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended.
    Inserted,
    /// An existing cart line had its quantity increased.
    Incremented,
    /// Nothing changed: the wishlist already held the item, or the cart
    /// line was already at its quantity cap.
    AlreadyPresent,
}

/// Ordered list of line items with at most one entry per `ItemId`.
///
/// The collection never holds two lines for the same item: adding an item
/// that is already present either sums the quantities (cart) or does nothing
/// (wishlist).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItems(Vec<LineItem>);

impl LineItems {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a list from arbitrary lines, collapsing duplicates.
    #[must_use]
    pub fn from_lines(kind: ListKind, lines: impl IntoIterator<Item = LineItem>) -> Self {
        let mut items = Self::new();
        for line in lines {
            items.add(line.item_id, line.quantity, kind);
        }
        items
    }

    /// Build a list from remote rows.
    ///
    /// Rows are expected to be unique per item already; if a store without a
    /// uniqueness constraint returned duplicates they are collapsed here.
    #[must_use]
    pub fn from_rows(kind: ListKind, rows: &[RemoteListRow]) -> Self {
        Self::from_lines(kind, rows.iter().map(RemoteListRow::to_line_item))
    }

    /// Add `quantity` of `item_id`.
    ///
    /// Wishlist entries are presence-only and always carry quantity 1.
    pub fn add(&mut self, item_id: ItemId, quantity: Quantity, kind: ListKind) -> AddOutcome {
        match self.0.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) if kind.tracks_quantity() => {
                line.quantity = line.quantity.saturating_add(quantity);
                AddOutcome::Incremented
            }
            Some(_) => AddOutcome::AlreadyPresent,
            None => {
                let quantity = if kind.tracks_quantity() {
                    quantity
                } else {
                    Quantity::ONE
                };
                self.0.push(LineItem::new(item_id, quantity));
                AddOutcome::Inserted
            }
        }
    }

    /// Remove the line for `item_id`. Returns whether a line was removed.
    pub fn remove(&mut self, item_id: ItemId) -> bool {
        let before = self.0.len();
        self.0.retain(|line| line.item_id != item_id);
        self.0.len() != before
    }

    /// Replace the quantity of an existing line. Returns whether the item was present.
    pub fn set_quantity(&mut self, item_id: ItemId, quantity: Quantity) -> bool {
        match self.0.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn get(&self, item_id: ItemId) -> Option<&LineItem> {
        self.0.iter().find(|line| line.item_id == item_id)
    }

    #[must_use]
    pub fn contains(&self, item_id: ItemId) -> bool {
        self.get(item_id).is_some()
    }

    /// Sum of all quantities, as shown on a cart badge.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.0.iter().map(|line| u64::from(line.quantity.get())).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[LineItem] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a LineItems {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for LineItems {
    type Item = LineItem;
    type IntoIter = std::vec::IntoIter<LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
