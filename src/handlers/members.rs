// src/handlers/members.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{CompanyMember, PermMembersRead, PermMembersUpdateRole, RequirePermission},
    models::rbac::{MemberRolePayload, MemberView, Membership, MyMembership, RoleSummary, SetActiveRolePayload},
};

// GET /api/companies/{company_id}/members
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/members",
    tag = "Members",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, body = Vec<MemberView>),
        (status = 403, description = "Requer members.read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersRead>,
) -> Result<impl IntoResponse, AppError> {
    let members = app_state.member_service.list_members(guard.access.company_id).await?;
    Ok(Json(members))
}

// PATCH /api/companies/{company_id}/members/{membership_id}
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/members/{membership_id}",
    tag = "Members",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("membership_id" = Uuid, Path, description = "ID da associação")
    ),
    request_body = SetActiveRolePayload,
    responses(
        (status = 200, body = Membership),
        (status = 400, description = "Cargo não pertence ao membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_member(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersUpdateRole>,
    Path((_company_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetActiveRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let membership = app_state
        .member_service
        .update_member(guard.access.company_id, membership_id, payload.active_role_id)
        .await?;
    Ok(Json(membership))
}

// POST /api/companies/{company_id}/members/{membership_id}/roles
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/members/{membership_id}/roles",
    tag = "Members",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("membership_id" = Uuid, Path, description = "ID da associação")
    ),
    request_body = MemberRolePayload,
    responses(
        (status = 201, description = "Cargos do membro após a concessão", body = Vec<RoleSummary>),
        (status = 400, description = "Cargo de sistema, arquivado ou de outra empresa"),
        (status = 409, description = "Membro já possui o cargo")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member_role(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersUpdateRole>,
    Path((_company_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MemberRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let roles = app_state
        .member_service
        .add_member_role(guard.access.company_id, membership_id, payload.role_id)
        .await?;
    Ok((StatusCode::CREATED, Json(roles)))
}

// DELETE /api/companies/{company_id}/members/{membership_id}/roles/{role_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/members/{membership_id}/roles/{role_id}",
    tag = "Members",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("membership_id" = Uuid, Path, description = "ID da associação"),
        ("role_id" = Uuid, Path, description = "ID do cargo")
    ),
    responses((status = 200, description = "Cargos restantes", body = Vec<RoleSummary>)),
    security(("api_jwt" = []))
)]
pub async fn remove_member_role(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersUpdateRole>,
    Path((_company_id, membership_id, role_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let roles = app_state
        .member_service
        .remove_member_role(guard.access.company_id, membership_id, role_id)
        .await?;
    Ok(Json(roles))
}

// DELETE /api/companies/{company_id}/members/{membership_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/members/{membership_id}",
    tag = "Members",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("membership_id" = Uuid, Path, description = "ID da associação")
    ),
    responses(
        (status = 200, description = "Associação arquivada", body = Membership),
        (status = 400, description = "O dono não pode ser removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn archive_member(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersUpdateRole>,
    Path((_company_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let membership = app_state
        .member_service
        .archive_member(guard.access.company_id, membership_id)
        .await?;
    Ok(Json(membership))
}

// ---
// Minha associação
// ---

// GET /api/companies/{company_id}/me
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/me",
    tag = "Members",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Associação, cargos e permissões efetivas", body = MyMembership),
        (status = 403, description = "Sem acesso à empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_membership(
    State(app_state): State<AppState>,
    CompanyMember(access): CompanyMember,
) -> Result<impl IntoResponse, AppError> {
    let me = app_state.member_service.get_my_membership(&access).await?;
    Ok(Json(me))
}

// PATCH /api/companies/{company_id}/me
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/me",
    tag = "Members",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = SetActiveRolePayload,
    responses(
        (status = 200, body = MyMembership),
        (status = 400, description = "Cargo não pertence ao membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_my_active_role(
    State(app_state): State<AppState>,
    CompanyMember(access): CompanyMember,
    Json(payload): Json<SetActiveRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let me = app_state
        .member_service
        .update_my_active_role(&access, payload.active_role_id)
        .await?;
    Ok(Json(me))
}
