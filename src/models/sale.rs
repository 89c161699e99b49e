// src/models/sale.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_ARCHIVED: &str = "archived";
pub const STATUS_OPEN: &str = "open";

/// Sale aggregate root. Totals are authoritative engine output, never taken
/// from the caller.
#[derive(Debug, Clone, FromRow)]
pub struct Sale {
    pub sale_id: Uuid,
    pub org_id: Uuid,
    pub terminal_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub sale_number: Option<String>,
    pub status: String,
    pub sale_type: String,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub discount_total: Decimal,
    pub grand_total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub sale_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    pub fn is_archived(&self) -> bool {
        self.status == STATUS_ARCHIVED
    }
}

/// Child of exactly one Sale; deleted and recreated wholesale on every
/// update (replace-all strategy).
#[derive(Debug, Clone, FromRow)]
pub struct SaleLine {
    pub sale_line_id: Uuid,
    pub sale_id: Uuid,
    pub org_id: Uuid,
    pub line_number: i32,
    pub item_id: Uuid,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub tax_id: Option<Uuid>,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Recorded payment against a sale. Same replace-on-update semantics as
/// `SaleLine`.
#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub sale_id: Uuid,
    pub org_id: Uuid,
    pub payment_method: String,
    pub amount: Decimal,
    pub currency: String,
    pub external_ref: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
