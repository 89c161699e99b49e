// src/models/item.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog item. Read-only to the checkout engine; owned by inventory.
#[derive(Debug, Clone, FromRow)]
pub struct Item {
    pub item_id: Uuid,
    pub org_id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub default_price: Decimal,
    pub tax_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
