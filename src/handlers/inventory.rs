// src/handlers/inventory.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermInventoryRead, PermInventoryWrite, PermSnapshotCreate, RequirePermission},
    models::inventory::{
        CreateRestockPayload, CreateSnapshotPayload, RestockDetail, RestockSummary, SnapshotDetail,
        SnapshotSummary, StockRow,
    },
};

// ---
// Contagens (snapshots)
// ---

// POST /api/companies/{company_id}/snapshots
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/snapshots",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateSnapshotPayload,
    responses(
        (status = 201, description = "Contagem registrada", body = SnapshotDetail),
        (status = 400, description = "Linhas vazias, repetidas ou itens inválidos"),
        (status = 403, description = "Requer inventory.snapshot.create")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_snapshot(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSnapshotCreate>,
    Json(payload): Json<CreateSnapshotPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let snapshot = app_state
        .inventory_service
        .create_snapshot(guard.access.company_id, guard.access.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

// GET /api/companies/{company_id}/snapshots
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/snapshots",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, body = Vec<SnapshotSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_snapshots(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let snapshots = app_state.inventory_service.list_snapshots(guard.access.company_id).await?;
    Ok(Json(snapshots))
}

// GET /api/companies/{company_id}/snapshots/{snapshot_id}
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/snapshots/{snapshot_id}",
    tag = "Inventory",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("snapshot_id" = Uuid, Path, description = "ID da contagem")
    ),
    responses((status = 200, body = SnapshotDetail), (status = 404, description = "Contagem não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn get_snapshot(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
    Path((_company_id, snapshot_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = app_state
        .inventory_service
        .get_snapshot(guard.access.company_id, snapshot_id)
        .await?;
    Ok(Json(snapshot))
}

// ---
// Reposições
// ---

// POST /api/companies/{company_id}/restocks
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/restocks",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateRestockPayload,
    responses(
        (status = 201, description = "Reposição registrada e custo lançado no caixa", body = RestockDetail),
        (status = 400, description = "Linhas vazias, repetidas ou itens inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_restock(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<CreateRestockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let restock = app_state
        .inventory_service
        .create_restock(guard.access.company_id, guard.access.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(restock)))
}

// GET /api/companies/{company_id}/restocks
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/restocks",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, body = Vec<RestockSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_restocks(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let restocks = app_state.inventory_service.list_restocks(guard.access.company_id).await?;
    Ok(Json(restocks))
}

// GET /api/companies/{company_id}/restocks/{restock_id}
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/restocks/{restock_id}",
    tag = "Inventory",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("restock_id" = Uuid, Path, description = "ID da reposição")
    ),
    responses((status = 200, body = RestockDetail), (status = 404, description = "Reposição não encontrada")),
    security(("api_jwt" = []))
)]
pub async fn get_restock(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
    Path((_company_id, restock_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let restock = app_state
        .inventory_service
        .get_restock(guard.access.company_id, restock_id)
        .await?;
    Ok(Json(restock))
}

// ---
// Estoque
// ---

// GET /api/companies/{company_id}/stock
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stock",
    tag = "Inventory",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Estoque atual por item", body = Vec<StockRow>)),
    security(("api_jwt" = []))
)]
pub async fn get_stock(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let stock = app_state.inventory_service.get_stock(guard.access.company_id).await?;
    Ok(Json(stock))
}
