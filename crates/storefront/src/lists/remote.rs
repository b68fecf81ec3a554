//! Remote list service: the server-side table of identified visitors' lists.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use cartsync_core::{ItemId, ListKind, OwnerId, Quantity, RemoteListRow, RowId};

use super::error::ServiceError;

/// Row-level access to one list kind's remote table.
///
/// Every call may fail with a [`ServiceError`]; callers decide whether the
/// failure is surfaced or retried.
#[async_trait]
pub trait RemoteListService: Send + Sync {
    /// The list kind this service stores.
    fn kind(&self) -> ListKind;

    /// All rows for `owner_id`, oldest first.
    async fn fetch_all(&self, owner_id: OwnerId) -> Result<Vec<RemoteListRow>, ServiceError>;

    /// The row for `item_id`, if the owner has one.
    async fn find_by_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<Option<RemoteListRow>, ServiceError>;

    /// Insert a new row. Fails with `ServiceError::Duplicate` if the owner
    /// already has a row for `item_id`.
    async fn insert(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<RemoteListRow, ServiceError>;

    /// Overwrite the quantity of an existing row.
    async fn update_quantity(
        &self,
        row_id: RowId,
        quantity: Quantity,
    ) -> Result<RemoteListRow, ServiceError>;

    async fn delete_by_row(&self, row_id: RowId) -> Result<(), ServiceError>;

    async fn delete_by_owner_and_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<(), ServiceError>;

    async fn delete_all_for_owner(&self, owner_id: OwnerId) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<RemoteListRow>,
    next_row_id: i32,
    calls: usize,
    /// Calls left before every call fails. `None` means healthy.
    failure_budget: Option<usize>,
    /// Calls that fail before the service recovers on its own.
    transient_failures: usize,
}

/// In-process [`RemoteListService`] with fault injection.
///
/// Enforces one row per `(owner_id, item_id)` like the database does.
#[derive(Debug)]
pub struct InMemoryListService {
    kind: ListKind,
    table: Mutex<Table>,
}

impl InMemoryListService {
    #[must_use]
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            table: Mutex::new(Table::default()),
        }
    }

    /// Let the next `n` calls succeed, then fail every call with
    /// `ServiceError::Unavailable` until [`heal`](Self::heal).
    pub fn fail_after(&self, n: usize) {
        self.lock().failure_budget = Some(n);
    }

    /// Fail the next `n` calls, then behave normally again.
    pub fn fail_next(&self, n: usize) {
        self.lock().transient_failures = n;
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        let mut table = self.lock();
        table.failure_budget = None;
        table.transient_failures = 0;
    }

    /// Number of service calls made so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Rows currently stored for `owner_id`, without counting as a call.
    #[must_use]
    pub fn rows(&self, owner_id: OwnerId) -> Vec<RemoteListRow> {
        self.lock()
            .rows
            .iter()
            .filter(|row| row.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Store a row directly, bypassing uniqueness checks and fault injection.
    pub fn seed(&self, owner_id: OwnerId, item_id: ItemId, quantity: Quantity) -> RowId {
        let mut table = self.lock();
        Self::push_row(&mut table, owner_id, item_id, quantity).row_id
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, op: &str) -> Result<MutexGuard<'_, Table>, ServiceError> {
        let mut table = self.lock();
        table.calls += 1;
        let rejected = if table.transient_failures > 0 {
            table.transient_failures -= 1;
            true
        } else if let Some(left) = table.failure_budget.as_mut() {
            let exhausted = *left == 0;
            *left = left.saturating_sub(1);
            exhausted
        } else {
            false
        };
        if rejected {
            return Err(ServiceError::Unavailable(format!(
                "{} service rejected {op}",
                self.kind
            )));
        }
        Ok(table)
    }

    fn push_row(
        table: &mut Table,
        owner_id: OwnerId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> RemoteListRow {
        table.next_row_id += 1;
        let row = RemoteListRow {
            row_id: RowId::new(table.next_row_id),
            owner_id,
            item_id,
            quantity,
            inserted_at: Utc::now(),
        };
        table.rows.push(row.clone());
        row
    }
}

#[async_trait]
impl RemoteListService for InMemoryListService {
    fn kind(&self) -> ListKind {
        self.kind
    }

    async fn fetch_all(&self, owner_id: OwnerId) -> Result<Vec<RemoteListRow>, ServiceError> {
        let table = self.begin("fetch_all")?;
        Ok(table
            .rows
            .iter()
            .filter(|row| row.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_by_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<Option<RemoteListRow>, ServiceError> {
        let table = self.begin("find_by_item")?;
        Ok(table
            .rows
            .iter()
            .find(|row| row.owner_id == owner_id && row.item_id == item_id)
            .cloned())
    }

    async fn insert(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<RemoteListRow, ServiceError> {
        let mut table = self.begin("insert")?;
        if table
            .rows
            .iter()
            .any(|row| row.owner_id == owner_id && row.item_id == item_id)
        {
            return Err(ServiceError::Duplicate { owner_id, item_id });
        }
        Ok(Self::push_row(&mut table, owner_id, item_id, quantity))
    }

    async fn update_quantity(
        &self,
        row_id: RowId,
        quantity: Quantity,
    ) -> Result<RemoteListRow, ServiceError> {
        let mut table = self.begin("update_quantity")?;
        let row = table
            .rows
            .iter_mut()
            .find(|row| row.row_id == row_id)
            .ok_or(ServiceError::RowNotFound(row_id))?;
        row.quantity = quantity;
        Ok(row.clone())
    }

    async fn delete_by_row(&self, row_id: RowId) -> Result<(), ServiceError> {
        let mut table = self.begin("delete_by_row")?;
        table.rows.retain(|row| row.row_id != row_id);
        Ok(())
    }

    async fn delete_by_owner_and_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<(), ServiceError> {
        let mut table = self.begin("delete_by_owner_and_item")?;
        table
            .rows
            .retain(|row| !(row.owner_id == owner_id && row.item_id == item_id));
        Ok(())
    }

    async fn delete_all_for_owner(&self, owner_id: OwnerId) -> Result<(), ServiceError> {
        let mut table = self.begin("delete_all_for_owner")?;
        table.rows.retain(|row| row.owner_id != owner_id);
        Ok(())
    }
}
