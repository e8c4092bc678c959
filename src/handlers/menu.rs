// src/handlers/menu.rs

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
    middleware::rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    models::menu::{CreateMenuEntryPayload, MenuEntryView},
};

// GET /api/companies/{company_id}/menu
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/menu",
    tag = "Menu",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, body = Vec<MenuEntryView>)),
    security(("api_jwt" = []))
)]
pub async fn list_menu(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.menu_service.list_entries(guard.access.company_id).await?;
    Ok(Json(entries))
}

// POST /api/companies/{company_id}/menu
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/menu",
    tag = "Menu",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateMenuEntryPayload,
    responses(
        (status = 201, body = MenuEntryView),
        (status = 400, description = "Informe itemId ou nome e preço"),
        (status = 409, description = "Item já está no cardápio")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_menu_entry(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<CreateMenuEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state
        .menu_service
        .create_entry(guard.access.company_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// DELETE /api/companies/{company_id}/menu/{entry_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/menu/{entry_id}",
    tag = "Menu",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("entry_id" = Uuid, Path, description = "ID da entrada")
    ),
    responses(
        (status = 204, description = "Entrada removida"),
        (status = 404, description = "Entrada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_menu_entry(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermInventoryWrite>,
    Path((_company_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .menu_service
        .delete_entry(guard.access.company_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
