// src/handlers/roles.rs

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
    middleware::rbac::{PermRolesManage, RequirePermission},
    models::rbac::{CompanyRole, CreateRolePayload, PermissionKey, UpdateRolePayload},
};

// GET /api/permissions (Para o frontend saber o que mostrar na tela de criação)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses((status = 200, description = "Lista fechada de permissões", body = Vec<PermissionKey>))
)]
pub async fn list_permissions() -> Result<impl IntoResponse, AppError> {
    Ok(Json(PermissionKey::ALL.to_vec()))
}

// GET /api/companies/{company_id}/roles
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/roles",
    tag = "RBAC",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, body = Vec<CompanyRole>),
        (status = 403, description = "Requer roles.manage")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermRolesManage>,
) -> Result<impl IntoResponse, AppError> {
    let roles = app_state.rbac_service.list_roles(guard.access.company_id).await?;
    Ok(Json(roles))
}

// POST /api/companies/{company_id}/roles
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/roles",
    tag = "RBAC",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateRolePayload,
    responses(
        (status = 201, body = CompanyRole),
        (status = 400, description = "Permissão fora da lista"),
        (status = 409, description = "Chave de cargo já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermRolesManage>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .create_role(guard.access.company_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(role)))
}

// PATCH /api/companies/{company_id}/roles/{role_id}
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/roles/{role_id}",
    tag = "RBAC",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("role_id" = Uuid, Path, description = "ID do cargo")
    ),
    request_body = UpdateRolePayload,
    responses(
        (status = 200, body = CompanyRole),
        (status = 400, description = "Cargo de sistema ou permissão inválida"),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermRolesManage>,
    Path((_company_id, role_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = app_state
        .rbac_service
        .update_role(guard.access.company_id, role_id, payload)
        .await?;
    Ok(Json(role))
}

// DELETE /api/companies/{company_id}/roles/{role_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/roles/{role_id}",
    tag = "RBAC",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("role_id" = Uuid, Path, description = "ID do cargo")
    ),
    responses((status = 200, description = "Cargo arquivado", body = CompanyRole)),
    security(("api_jwt" = []))
)]
pub async fn archive_role(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermRolesManage>,
    Path((_company_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let role = app_state
        .rbac_service
        .archive_role(guard.access.company_id, role_id)
        .await?;
    Ok(Json(role))
}
