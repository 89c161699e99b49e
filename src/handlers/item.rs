// src/handlers/item.rs
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use sqlx::Error as SqlxError;
use tracing::instrument;
use uuid::Uuid;

use crate::dtos::item::{CreateItemRequest, ItemResponse, UpdateItemRequest};
use crate::error::AppError;
use crate::middleware::auth::OrgContext;
use crate::models::item::Item;
use crate::state::AppState;

const ITEM_COLUMNS: &str = "item_id, org_id, sku, name, description, default_price, tax_id, \
     is_active, created_at, updated_at";

fn map_fk_violation(err: SqlxError, message: &str) -> AppError {
    match err {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            AppError::reference(message)
        }
        other => other.into(),
    }
}

// GET /items - active catalog for the caller's org
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id))]
pub async fn get_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE org_id = $1 AND is_active ORDER BY name"
    ))
    .bind(ctx.org_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

// GET /items/:id
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id, %item_id))]
pub async fn get_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE item_id = $1 AND org_id = $2"
    ))
    .bind(item_id)
    .bind(ctx.org_id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Item not found"))?;

    Ok(Json(ItemResponse::from(item)))
}

// POST /items
#[instrument(skip(state, ctx, payload), fields(org_id = %ctx.org_id))]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    if payload.default_price < Decimal::ZERO {
        return Err(AppError::validation("Default price cannot be negative"));
    }

    let item = sqlx::query_as::<_, Item>(&format!(
        "INSERT INTO items (item_id, org_id, sku, name, description, default_price, tax_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(ctx.org_id)
    .bind(&payload.sku)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.default_price)
    .bind(payload.tax_id)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_fk_violation(e, "Referenced tax rate does not exist"))?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

// PUT /items/:id
#[instrument(skip(state, ctx, payload), fields(org_id = %ctx.org_id, %item_id))]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    if let Some(price) = payload.default_price {
        if price < Decimal::ZERO {
            return Err(AppError::validation("Default price cannot be negative"));
        }
    }

    let item = sqlx::query_as::<_, Item>(&format!(
        "UPDATE items SET
             sku = COALESCE($1, sku),
             name = COALESCE($2, name),
             description = COALESCE($3, description),
             default_price = COALESCE($4, default_price),
             tax_id = COALESCE($5, tax_id),
             is_active = COALESCE($6, is_active),
             updated_at = NOW()
         WHERE item_id = $7 AND org_id = $8
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(&payload.sku)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.default_price)
    .bind(payload.tax_id)
    .bind(payload.is_active)
    .bind(item_id)
    .bind(ctx.org_id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_fk_violation(e, "Referenced tax rate does not exist"))?
    .ok_or_else(|| AppError::not_found("Item not found"))?;

    Ok(Json(ItemResponse::from(item)))
}

// DELETE /items/:id - deactivate rather than physically delete
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id, %item_id))]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("UPDATE items SET is_active = FALSE, updated_at = NOW() WHERE item_id = $1 AND org_id = $2")
        .bind(item_id)
        .bind(ctx.org_id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Item not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
