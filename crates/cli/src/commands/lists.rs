//! List inspection commands.
//!
//! Reads an identified visitor's lists straight from the remote list tables.
//! Anonymous lists live in sessions and are not reachable from here.

use serde_json::json;

use cartsync_core::{LineItems, ListKind, OwnerId};
use cartsync_storefront::db::{PgListService, create_pool};
use cartsync_storefront::lists::RemoteListService;

use super::{CommandError, database_url};

/// Print `owner`'s stored lists as JSON. Prints both lists when `kind` is `None`.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a row is corrupt.
pub async fn show(owner: OwnerId, kind: Option<ListKind>) -> Result<(), CommandError> {
    let pool = create_pool(&database_url()?).await?;
    let kinds = kind.map_or_else(|| ListKind::ALL.to_vec(), |kind| vec![kind]);

    let mut lists = serde_json::Map::new();
    for kind in kinds {
        let rows = PgListService::new(pool.clone(), kind).fetch_all(owner).await?;
        let items = LineItems::from_rows(kind, &rows);
        let count = items.total_quantity();
        tracing::info!(%owner, list = %kind, rows = rows.len(), "Fetched list");
        lists.insert(
            kind.to_string(),
            json!({
                "items": items,
                "count": count,
                "rows": rows,
            }),
        );
    }

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "owner_id": owner, "lists": lists }))?
        );
    }
    Ok(())
}
