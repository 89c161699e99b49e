// src/dtos/item.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::item::Item;

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub default_price: Decimal,
    pub tax_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_price: Option<Decimal>,
    pub tax_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
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

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            item_id: item.item_id,
            org_id: item.org_id,
            sku: item.sku,
            name: item.name,
            description: item.description,
            default_price: item.default_price,
            tax_id: item.tax_id,
            is_active: item.is_active,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
