// src/handlers/annual.rs

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
    middleware::rbac::{PermCompanyUpdate, PermStatsRead, RequirePermission},
    models::analytics::{AnnualEntry, AnnualEntryPayload, AnnualQuery, AnnualRow},
};

// GET /api/companies/{company_id}/annual
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/annual",
    tag = "Annual Report",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), AnnualQuery),
    responses(
        (status = 200, description = "Linhas do ano (manuais têm prioridade sobre as automáticas)", body = Vec<AnnualRow>),
        (status = 400, description = "Ano fora de 2000..2100")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_annual(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<AnnualQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.annual_service.list(guard.access.company_id, query).await?;
    Ok(Json(rows))
}

// POST /api/companies/{company_id}/annual
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/annual",
    tag = "Annual Report",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = AnnualEntryPayload,
    responses((status = 201, description = "Lançamento manual criado ou substituído", body = AnnualEntry)),
    security(("api_jwt" = []))
)]
pub async fn upsert_annual_entry(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyUpdate>,
    Json(payload): Json<AnnualEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let entry = app_state
        .annual_service
        .upsert_entry(guard.access.company_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// DELETE /api/companies/{company_id}/annual/{entry_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/annual/{entry_id}",
    tag = "Annual Report",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("entry_id" = Uuid, Path, description = "ID do lançamento")
    ),
    responses(
        (status = 204, description = "Lançamento removido"),
        (status = 404, description = "Lançamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_annual_entry(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyUpdate>,
    Path((_company_id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .annual_service
        .delete_entry(guard.access.company_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
