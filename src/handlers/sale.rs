// src/handlers/sale.rs
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::dtos::sale::{
    CreateSaleRequest, SaleListItem, SaleResponse, UpdateSaleRequest,
};
use crate::error::AppError;
use crate::middleware::auth::OrgContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// POST /sales
#[instrument(skip(state, ctx, payload), fields(org_id = %ctx.org_id))]
pub async fn create_sale(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(mut payload): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    // Default the creator to the authenticated user.
    payload.created_by = payload.created_by.or(Some(ctx.user_id));

    let (sale, lines, payments) = state
        .sales
        .create_sale(&state.db_pool, ctx.org_id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaleResponse::from_parts(sale, lines, payments)),
    ))
}

// GET /sales
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id))]
pub async fn list_sales(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SaleListItem>>, AppError> {
    let limit = params.limit.unwrap_or(100).clamp(1, 500);
    let offset = params.offset.unwrap_or(0).max(0);

    let sales = state
        .sales
        .get_by_org(&state.db_pool, ctx.org_id, limit, offset)
        .await?;

    Ok(Json(sales.into_iter().map(SaleListItem::from).collect()))
}

// GET /sales/:id
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id, %sale_id))]
pub async fn get_sale(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleResponse>, AppError> {
    let (sale, lines, payments) = state
        .sales
        .get_with_relations(&state.db_pool, ctx.org_id, sale_id)
        .await?;

    Ok(Json(SaleResponse::from_parts(sale, lines, payments)))
}

// PATCH /sales/:id - partial patch, full recompute, replace-all children
#[instrument(skip(state, ctx, payload), fields(org_id = %ctx.org_id, %sale_id))]
pub async fn update_sale(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let (sale, lines, payments) = state
        .sales
        .update_sale(&state.db_pool, ctx.org_id, sale_id, payload)
        .await?;

    Ok(Json(SaleResponse::from_parts(sale, lines, payments)))
}

// DELETE /sales/:id - archive, not a physical delete
#[instrument(skip(state, ctx), fields(org_id = %ctx.org_id, %sale_id))]
pub async fn archive_sale(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<SaleResponse>, AppError> {
    let (sale, lines, payments) = state
        .sales
        .archive_sale(&state.db_pool, ctx.org_id, sale_id)
        .await?;

    Ok(Json(SaleResponse::from_parts(sale, lines, payments)))
}
