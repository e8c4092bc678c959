// src/handlers/invites.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermMembersInvite, RequirePermission},
    },
    models::invite::{AcceptInvitePayload, AcceptedInvite, CreateInvitePayload, Invite},
};

// POST /api/companies/{company_id}/invites
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/invites",
    tag = "Invites",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = CreateInvitePayload,
    responses(
        (status = 201, description = "Convite criado (código de 6 caracteres)", body = Invite),
        (status = 400, description = "Cargo inválido para convite"),
        (status = 403, description = "Requer members.invite")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invite(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersInvite>,
    Json(payload): Json<CreateInvitePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invite = app_state
        .invite_service
        .create_invite(guard.access.company_id, guard.access.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(invite)))
}

// GET /api/companies/{company_id}/invites
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/invites",
    tag = "Invites",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, body = Vec<Invite>)),
    security(("api_jwt" = []))
)]
pub async fn list_invites(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermMembersInvite>,
) -> Result<impl IntoResponse, AppError> {
    let invites = app_state.invite_service.list_invites(guard.access.company_id).await?;
    Ok(Json(invites))
}

// POST /api/invites/accept
#[utoipa::path(
    post,
    path = "/api/invites/accept",
    tag = "Invites",
    request_body = AcceptInvitePayload,
    responses(
        (status = 201, description = "Convite aceito, associação criada", body = AcceptedInvite),
        (status = 400, description = "Convite expirado ou não pendente"),
        (status = 403, description = "Convite emitido para outro e-mail"),
        (status = 404, description = "Convite não encontrado"),
        (status = 409, description = "Usuário já é membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_invite(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AcceptInvitePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let accepted = app_state.invite_service.accept_invite(&user, &payload.code).await?;
    Ok((StatusCode::CREATED, Json(accepted)))
}
