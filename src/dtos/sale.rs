// src/dtos/sale.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sale::{Payment, Sale, SaleLine};

fn default_currency() -> String {
    "USD".to_string()
}

fn default_status() -> String {
    crate::models::sale::STATUS_OPEN.to_string()
}

fn default_sale_type() -> String {
    "pos".to_string()
}

/// One proposed line of a draft sale. Only the computed counterpart is ever
/// persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineInput {
    pub item_id: Uuid,
    pub line_number: i32,
    pub description: Option<String>,
    pub quantity: Decimal,
    /// Overrides the item's default price when present.
    pub unit_price: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    /// Overrides the item's default tax rate when present.
    pub tax_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub payment_method: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub external_ref: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Draft sale as submitted by the caller. The org id comes from the request
/// context, never from the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub terminal_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub sale_number: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_sale_type")]
    pub sale_type: String,
    pub sale_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub lines: Vec<SaleLineInput>,
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
}

/// Partial patch for an existing sale. Totals are never patchable; the only
/// path to new totals is merge-then-recalculate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSaleRequest {
    pub terminal_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
    pub sale_type: Option<String>,
    pub sale_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub lines: Option<Vec<SaleLineInput>>,
    pub payments: Option<Vec<PaymentInput>>,
}

impl UpdateSaleRequest {
    /// Merges this patch onto the persisted sale to produce a full draft for
    /// recalculation. Unspecified fields and children fall back to the
    /// existing persisted values; stored prices/discounts become explicit
    /// overrides so the recompute is deterministic against the current
    /// catalog.
    pub fn into_recalculation_draft(
        self,
        existing: &Sale,
        lines: &[SaleLine],
        payments: &[Payment],
    ) -> CreateSaleRequest {
        let merged_lines = match self.lines {
            Some(lines) => lines,
            None => lines
                .iter()
                .map(|line| SaleLineInput {
                    item_id: line.item_id,
                    line_number: line.line_number,
                    description: line.description.clone(),
                    quantity: line.quantity,
                    unit_price: Some(line.unit_price),
                    discount_amount: Some(line.discount_amount),
                    tax_id: line.tax_id,
                })
                .collect(),
        };

        let merged_payments = match self.payments {
            Some(payments) => payments,
            None => payments
                .iter()
                .map(|p| PaymentInput {
                    payment_method: p.payment_method.clone(),
                    amount: p.amount,
                    currency: p.currency.clone(),
                    external_ref: p.external_ref.clone(),
                    processed_at: p.processed_at,
                })
                .collect(),
        };

        CreateSaleRequest {
            terminal_id: self.terminal_id.or(existing.terminal_id),
            customer_id: self.customer_id.or(existing.customer_id),
            sale_number: existing.sale_number.clone(),
            status: self.status.unwrap_or_else(|| existing.status.clone()),
            sale_type: self.sale_type.unwrap_or_else(|| existing.sale_type.clone()),
            sale_date: self.sale_date.unwrap_or(existing.sale_date),
            notes: self.notes.or_else(|| existing.notes.clone()),
            created_by: existing.created_by,
            lines: merged_lines,
            payments: merged_payments,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleLineResponse {
    pub sale_line_id: Uuid,
    pub sale_id: Uuid,
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

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub sale_id: Uuid,
    pub payment_method: String,
    pub amount: Decimal,
    pub currency: String,
    pub external_ref: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
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
    pub lines: Vec<SaleLineResponse>,
    pub payments: Vec<PaymentResponse>,
}

/// Header-only row for list views.
#[derive(Debug, Serialize)]
pub struct SaleListItem {
    pub sale_id: Uuid,
    pub terminal_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub sale_number: Option<String>,
    pub status: String,
    pub sale_type: String,
    pub grand_total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub sale_date: DateTime<Utc>,
}

impl From<SaleLine> for SaleLineResponse {
    fn from(line: SaleLine) -> Self {
        Self {
            sale_line_id: line.sale_line_id,
            sale_id: line.sale_id,
            line_number: line.line_number,
            item_id: line.item_id,
            description: line.description,
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount_amount: line.discount_amount,
            tax_id: line.tax_id,
            tax_amount: line.tax_amount,
            line_total: line.line_total,
            created_at: line.created_at,
        }
    }
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.payment_id,
            sale_id: p.sale_id,
            payment_method: p.payment_method,
            amount: p.amount,
            currency: p.currency,
            external_ref: p.external_ref,
            processed_at: p.processed_at,
            created_at: p.created_at,
        }
    }
}

impl SaleResponse {
    pub fn from_parts(sale: Sale, lines: Vec<SaleLine>, payments: Vec<Payment>) -> Self {
        Self {
            sale_id: sale.sale_id,
            org_id: sale.org_id,
            terminal_id: sale.terminal_id,
            customer_id: sale.customer_id,
            sale_number: sale.sale_number,
            status: sale.status,
            sale_type: sale.sale_type,
            subtotal: sale.subtotal,
            tax_total: sale.tax_total,
            discount_total: sale.discount_total,
            grand_total: sale.grand_total,
            amount_paid: sale.amount_paid,
            balance_due: sale.balance_due,
            sale_date: sale.sale_date,
            notes: sale.notes,
            created_by: sale.created_by,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
            lines: lines.into_iter().map(SaleLineResponse::from).collect(),
            payments: payments.into_iter().map(PaymentResponse::from).collect(),
        }
    }
}

impl From<Sale> for SaleListItem {
    fn from(sale: Sale) -> Self {
        Self {
            sale_id: sale.sale_id,
            terminal_id: sale.terminal_id,
            customer_id: sale.customer_id,
            sale_number: sale.sale_number,
            status: sale.status,
            sale_type: sale.sale_type,
            grand_total: sale.grand_total,
            amount_paid: sale.amount_paid,
            balance_due: sale.balance_due,
            sale_date: sale.sale_date,
        }
    }
}
