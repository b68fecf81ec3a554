//! `PostgreSQL` implementation of the remote list service.
//!
//! One table per list kind. Both tables carry `UNIQUE (owner_id, item_id)`,
//! so the one-row-per-item invariant holds even when two writers race the
//! find-then-insert sequence used by the controller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cartsync_core::{ItemId, ListKind, OwnerId, Quantity, RemoteListRow, RowId};

use super::RepositoryError;
use crate::lists::{RemoteListService, ServiceError};

/// SQL for one list table.
struct Statements {
    fetch_all: &'static str,
    find_by_item: &'static str,
    insert: &'static str,
    update_quantity: &'static str,
    delete_by_row: &'static str,
    delete_by_owner_and_item: &'static str,
    delete_all_for_owner: &'static str,
}

macro_rules! list_statements {
    ($table:literal) => {
        Statements {
            fetch_all: concat!(
                "SELECT id, owner_id, item_id, quantity, inserted_at FROM ",
                $table,
                " WHERE owner_id = $1 ORDER BY inserted_at ASC, id ASC"
            ),
            find_by_item: concat!(
                "SELECT id, owner_id, item_id, quantity, inserted_at FROM ",
                $table,
                " WHERE owner_id = $1 AND item_id = $2"
            ),
            insert: concat!(
                "INSERT INTO ",
                $table,
                " (owner_id, item_id, quantity) VALUES ($1, $2, $3)",
                " RETURNING id, owner_id, item_id, quantity, inserted_at"
            ),
            update_quantity: concat!(
                "UPDATE ",
                $table,
                " SET quantity = $2 WHERE id = $1",
                " RETURNING id, owner_id, item_id, quantity, inserted_at"
            ),
            delete_by_row: concat!("DELETE FROM ", $table, " WHERE id = $1"),
            delete_by_owner_and_item: concat!(
                "DELETE FROM ",
                $table,
                " WHERE owner_id = $1 AND item_id = $2"
            ),
            delete_all_for_owner: concat!("DELETE FROM ", $table, " WHERE owner_id = $1"),
        }
    };
}

static CART_STATEMENTS: Statements = list_statements!("storefront.cart_item");
static WISHLIST_STATEMENTS: Statements = list_statements!("storefront.wishlist_item");

fn statements(kind: ListKind) -> &'static Statements {
    match kind {
        ListKind::Cart => &CART_STATEMENTS,
        ListKind::Wishlist => &WISHLIST_STATEMENTS,
    }
}

/// Raw row as stored in `PostgreSQL`.
#[derive(sqlx::FromRow)]
struct ListItemRecord {
    id: i32,
    owner_id: Uuid,
    item_id: i32,
    quantity: i32,
    inserted_at: DateTime<Utc>,
}

impl TryFrom<ListItemRecord> for RemoteListRow {
    type Error = RepositoryError;

    fn try_from(r: ListItemRecord) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(r.quantity).map_err(|q| {
            RepositoryError::DataCorruption(format!("invalid quantity {q} in row {}", r.id))
        })?;

        Ok(Self {
            row_id: RowId::new(r.id),
            owner_id: OwnerId::new(r.owner_id),
            item_id: ItemId::new(r.item_id),
            quantity,
            inserted_at: r.inserted_at,
        })
    }
}

/// Remote list service backed by a `PostgreSQL` table.
#[derive(Clone)]
pub struct PgListService {
    pool: PgPool,
    kind: ListKind,
}

impl PgListService {
    /// Create a service for one list kind.
    #[must_use]
    pub const fn new(pool: PgPool, kind: ListKind) -> Self {
        Self { pool, kind }
    }

    fn sql(&self) -> &'static Statements {
        statements(self.kind)
    }
}

#[async_trait]
impl RemoteListService for PgListService {
    fn kind(&self) -> ListKind {
        self.kind
    }

    async fn fetch_all(&self, owner_id: OwnerId) -> Result<Vec<RemoteListRow>, ServiceError> {
        let records = sqlx::query_as::<_, ListItemRecord>(self.sql().fetch_all)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        let mut rows = Vec::with_capacity(records.len());
        for r in records {
            rows.push(RemoteListRow::try_from(r)?);
        }
        Ok(rows)
    }

    async fn find_by_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<Option<RemoteListRow>, ServiceError> {
        let record = sqlx::query_as::<_, ListItemRecord>(self.sql().find_by_item)
            .bind(owner_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        match record {
            Some(r) => Ok(Some(RemoteListRow::try_from(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<RemoteListRow, ServiceError> {
        let record = sqlx::query_as::<_, ListItemRecord>(self.sql().insert)
            .bind(owner_id)
            .bind(item_id)
            .bind(quantity.as_i32())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return ServiceError::Duplicate { owner_id, item_id };
                }
                ServiceError::from(RepositoryError::Database(e))
            })?;

        Ok(RemoteListRow::try_from(record)?)
    }

    async fn update_quantity(
        &self,
        row_id: RowId,
        quantity: Quantity,
    ) -> Result<RemoteListRow, ServiceError> {
        let record = sqlx::query_as::<_, ListItemRecord>(self.sql().update_quantity)
            .bind(row_id)
            .bind(quantity.as_i32())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        let record = record.ok_or(ServiceError::RowNotFound(row_id))?;
        Ok(RemoteListRow::try_from(record)?)
    }

    async fn delete_by_row(&self, row_id: RowId) -> Result<(), ServiceError> {
        sqlx::query(self.sql().delete_by_row)
            .bind(row_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn delete_by_owner_and_item(
        &self,
        owner_id: OwnerId,
        item_id: ItemId,
    ) -> Result<(), ServiceError> {
        sqlx::query(self.sql().delete_by_owner_and_item)
            .bind(owner_id)
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }

    async fn delete_all_for_owner(&self, owner_id: OwnerId) -> Result<(), ServiceError> {
        let result = sqlx::query(self.sql().delete_all_for_owner)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        tracing::debug!(
            list = %self.kind,
            %owner_id,
            deleted = result.rows_affected(),
            "Cleared remote list"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_target_their_table() {
        assert!(CART_STATEMENTS.fetch_all.contains("storefront.cart_item "));
        assert!(WISHLIST_STATEMENTS.insert.contains("storefront.wishlist_item "));
        assert!(statements(ListKind::Wishlist).delete_all_for_owner.ends_with("owner_id = $1"));
    }

    #[test]
    fn test_record_with_zero_quantity_is_corrupt() {
        let record = ListItemRecord {
            id: 7,
            owner_id: Uuid::nil(),
            item_id: 3,
            quantity: 0,
            inserted_at: Utc::now(),
        };
        let err = RemoteListRow::try_from(record).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_record_conversion() {
        let record = ListItemRecord {
            id: 7,
            owner_id: Uuid::nil(),
            item_id: 3,
            quantity: 2,
            inserted_at: Utc::now(),
        };
        let row = RemoteListRow::try_from(record).unwrap();
        assert_eq!(row.row_id, RowId::new(7));
        assert_eq!(row.item_id, ItemId::new(3));
        assert_eq!(row.quantity.get(), 2);
    }
}
