// src/models/tax_rate.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Tax rate applied as a flat percentage of the discounted line subtotal.
/// `is_compound` is stored and echoed back but never stacked.
#[derive(Debug, Clone, FromRow)]
pub struct TaxRate {
    pub tax_id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub rate_percent: Decimal,
    pub is_compound: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
