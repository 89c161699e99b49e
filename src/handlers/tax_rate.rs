// src/handlers/tax_rate.rs
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::dtos::tax_rate::{CreateTaxRateRequest, TaxRateResponse, UpdateTaxRateRequest};
use crate::error::AppError;
use crate::middleware::auth::OrgContext;
use crate::models::tax_rate::TaxRate;
use crate::state::AppState;

const TAX_COLUMNS: &str =
    "tax_id, org_id, name, rate_percent, is_compound, is_default, created_at, updated_at";

// GET /tax-rates
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id))]
pub async fn get_tax_rates(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> Result<Json<Vec<TaxRateResponse>>, AppError> {
    let rates = sqlx::query_as::<_, TaxRate>(&format!(
        "SELECT {TAX_COLUMNS} FROM tax_rates WHERE org_id = $1 ORDER BY name"
    ))
    .bind(ctx.org_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rates.into_iter().map(TaxRateResponse::from).collect()))
}

// GET /tax-rates/:id
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id, %tax_id))]
pub async fn get_tax_rate(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(tax_id): Path<Uuid>,
) -> Result<Json<TaxRateResponse>, AppError> {
    let rate = sqlx::query_as::<_, TaxRate>(&format!(
        "SELECT {TAX_COLUMNS} FROM tax_rates WHERE tax_id = $1 AND org_id = $2"
    ))
    .bind(tax_id)
    .bind(ctx.org_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Tax rate not found"))?;

    Ok(Json(TaxRateResponse::from(rate)))
}

// POST /tax-rates
#[instrument(skip(state, ctx, payload), fields(org_id = %ctx.org_id))]
pub async fn create_tax_rate(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateTaxRateRequest>,
) -> Result<(StatusCode, Json<TaxRateResponse>), AppError> {
    if payload.rate_percent < Decimal::ZERO {
        return Err(AppError::validation("Rate percent cannot be negative"));
    }

    let rate = sqlx::query_as::<_, TaxRate>(&format!(
        "INSERT INTO tax_rates (tax_id, org_id, name, rate_percent, is_compound, is_default)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {TAX_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(ctx.org_id)
    .bind(&payload.name)
    .bind(payload.rate_percent)
    .bind(payload.is_compound)
    .bind(payload.is_default)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(TaxRateResponse::from(rate))))
}

// PUT /tax-rates/:id
#[instrument(skip(state, ctx, payload), fields(org_id = %ctx.org_id, %tax_id))]
pub async fn update_tax_rate(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(tax_id): Path<Uuid>,
    Json(payload): Json<UpdateTaxRateRequest>,
) -> Result<Json<TaxRateResponse>, AppError> {
    if let Some(rate) = payload.rate_percent {
        if rate < Decimal::ZERO {
            return Err(AppError::validation("Rate percent cannot be negative"));
        }
    }

    let rate = sqlx::query_as::<_, TaxRate>(&format!(
        "UPDATE tax_rates SET
             name = COALESCE($1, name),
             rate_percent = COALESCE($2, rate_percent),
             is_compound = COALESCE($3, is_compound),
             is_default = COALESCE($4, is_default),
             updated_at = NOW()
         WHERE tax_id = $5 AND org_id = $6
         RETURNING {TAX_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(payload.rate_percent)
    .bind(payload.is_compound)
    .bind(payload.is_default)
    .bind(tax_id)
    .bind(ctx.org_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Tax rate not found"))?;

    Ok(Json(TaxRateResponse::from(rate)))
}

// DELETE /tax-rates/:id
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id, %tax_id))]
pub async fn delete_tax_rate(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(tax_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM tax_rates WHERE tax_id = $1 AND org_id = $2")
        .bind(tax_id)
        .bind(ctx.org_id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                AppError::conflict("Tax rate is referenced by existing records")
            }
            other => other.into(),
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Tax rate not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
