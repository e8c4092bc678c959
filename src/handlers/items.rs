// src/handlers/items.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    models::inventory::{CreateItemPayload, Item, ItemQuery, UpdateItemPayload},
};

// GET /api/companies/{company_id}/items
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/items",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), ItemQuery),
    responses(
        (status = 200, body = Vec<Item>),
        (status = 403, description = "Requer inventory.read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
    Query(query): Query<ItemQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state
        .inventory_service
        .list_items(guard.access.company_id, query)
        .await?;
    Ok(Json(items))
}

// POST /api/companies/{company_id}/items
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/items",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateItemPayload,
    responses(
        (status = 201, body = Item),
        (status = 409, description = "Já existe um item com este nome")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<CreateItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .create_item(guard.access.company_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

// PATCH /api/companies/{company_id}/items/{item_id}
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/items/{item_id}",
    tag = "Inventory",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("item_id" = Uuid, Path, description = "ID do item")
    ),
    request_body = UpdateItemPayload,
    responses(
        (status = 200, body = Item),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryWrite>,
    Path((_company_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let item = app_state
        .inventory_service
        .update_item(guard.access.company_id, item_id, payload)
        .await?;
    Ok(Json(item))
}

// DELETE /api/companies/{company_id}/items/{item_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/items/{item_id}",
    tag = "Inventory",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("item_id" = Uuid, Path, description = "ID do item")
    ),
    responses((status = 200, description = "Item arquivado", body = Item)),
    security(("api_jwt" = []))
)]
pub async fn archive_item(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryWrite>,
    Path((_company_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state
        .inventory_service
        .archive_item(guard.access.company_id, item_id)
        .await?;
    Ok(Json(item))
}
