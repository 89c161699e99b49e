// src/services/catalog.rs
//
// Org-scoped catalog lookups for the checkout engine. Rows that do not
// belong to the organization are silently absent from the result; callers
// treat a missing id as the failure signal.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::item::Item;
use crate::models::tax_rate::TaxRate;

pub async fn load_items(
    conn: &mut PgConnection,
    org_id: Uuid,
    item_ids: &[Uuid],
) -> Result<Vec<Item>, sqlx::Error> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Item>(
        "SELECT item_id, org_id, sku, name, description, default_price,
                tax_id, is_active, created_at, updated_at
         FROM items
         WHERE org_id = $1 AND item_id = ANY($2)",
    )
    .bind(org_id)
    .bind(item_ids)
    .fetch_all(conn)
    .await
}

pub async fn load_tax_rates(
    conn: &mut PgConnection,
    org_id: Uuid,
    tax_ids: &[Uuid],
) -> Result<Vec<TaxRate>, sqlx::Error> {
    if tax_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, TaxRate>(
        "SELECT tax_id, org_id, name, rate_percent, is_compound, is_default,
                created_at, updated_at
         FROM tax_rates
         WHERE org_id = $1 AND tax_id = ANY($2)",
    )
    .bind(org_id)
    .bind(tax_ids)
    .fetch_all(conn)
    .await
}
