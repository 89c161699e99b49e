// src/dtos/tax_rate.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tax_rate::TaxRate;

#[derive(Debug, Deserialize)]
pub struct CreateTaxRateRequest {
    pub name: String,
    /// Percentage, e.g. 8.25 for 8.25%.
    pub rate_percent: Decimal,
    #[serde(default)]
    pub is_compound: bool,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaxRateRequest {
    pub name: Option<String>,
    pub rate_percent: Option<Decimal>,
    pub is_compound: Option<bool>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TaxRateResponse {
    pub tax_id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub rate_percent: Decimal,
    pub is_compound: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaxRate> for TaxRateResponse {
    fn from(rate: TaxRate) -> Self {
        Self {
            tax_id: rate.tax_id,
            org_id: rate.org_id,
            name: rate.name,
            rate_percent: rate.rate_percent,
            is_compound: rate.is_compound,
            is_default: rate.is_default,
            created_at: rate.created_at,
            updated_at: rate.updated_at,
        }
    }
}
