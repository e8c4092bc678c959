// src/handlers/companies.rs

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
    middleware::{
        auth::AuthenticatedUser,
        rbac::{CompanyMember, PermCompanyArchive, PermCompanyUpdate, RequirePermission},
    },
    models::company::{
        Company, CompanyLocation, CreateCompanyPayload, CreatedCompany, LocationPayload, UpdateCompanyPayload,
    },
};

// ---
// Empresas
// ---

// POST /api/companies
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "Companies",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada com cargo Owner e associação do criador", body = CreatedCompany),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Slug já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state.company_service.create_company(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/companies
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "Companies",
    responses((status = 200, description = "Empresas do usuário", body = Vec<Company>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.company_service.list_my_companies(user.id).await?;
    Ok(Json(companies))
}

// GET /api/companies/{company_id}
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, body = Company),
        (status = 403, description = "Sem acesso à empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    CompanyMember(access): CompanyMember,
) -> Result<impl IntoResponse, AppError> {
    let company = app_state.company_service.get_company(access.company_id).await?;
    Ok(Json(company))
}

// PATCH /api/companies/{company_id}
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, body = Company),
        (status = 403, description = "Requer company.update")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyUpdate>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let company = app_state
        .company_service
        .update_company(guard.access.company_id, payload)
        .await?;
    Ok(Json(company))
}

// DELETE /api/companies/{company_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Empresa arquivada", body = Company),
        (status = 403, description = "Requer company.archive")
    ),
    security(("api_jwt" = []))
)]
pub async fn archive_company(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyArchive>,
) -> Result<impl IntoResponse, AppError> {
    let company = app_state.company_service.archive_company(guard.access.company_id).await?;
    Ok(Json(company))
}

// ---
// Locais
// ---

// GET /api/companies/{company_id}/locations
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/locations",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, body = Vec<CompanyLocation>)),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    CompanyMember(access): CompanyMember,
) -> Result<impl IntoResponse, AppError> {
    let locations = app_state.company_service.list_locations(access.company_id).await?;
    Ok(Json(locations))
}

// POST /api/companies/{company_id}/locations
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/locations",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = LocationPayload,
    responses(
        (status = 201, body = CompanyLocation),
        (status = 409, description = "Nome já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyUpdate>,
    Json(payload): Json<LocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let location = app_state
        .company_service
        .create_location(guard.access.company_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

// PATCH /api/companies/{company_id}/locations/{location_id}
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/locations/{location_id}",
    tag = "Companies",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("location_id" = Uuid, Path, description = "ID do local")
    ),
    request_body = LocationPayload,
    responses((status = 200, body = CompanyLocation), (status = 404, description = "Local não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn update_location(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyUpdate>,
    Path((_company_id, location_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<LocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let location = app_state
        .company_service
        .update_location(guard.access.company_id, location_id, payload)
        .await?;
    Ok(Json(location))
}

// DELETE /api/companies/{company_id}/locations/{location_id}
#[utoipa::path(
    delete,
    path = "/api/companies/{company_id}/locations/{location_id}",
    tag = "Companies",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("location_id" = Uuid, Path, description = "ID do local")
    ),
    responses((status = 200, description = "Local arquivado", body = CompanyLocation)),
    security(("api_jwt" = []))
)]
pub async fn archive_location(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermCompanyUpdate>,
    Path((_company_id, location_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let location = app_state
        .company_service
        .archive_location(guard.access.company_id, location_id)
        .await?;
    Ok(Json(location))
}
