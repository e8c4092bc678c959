// src/handlers/sales_cards.rs

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
    middleware::rbac::{
        CompanyMember, PermSalesCardsCreate, PermSalesCardsEdit, PermSalesCardsLock, PermSalesCardsRead,
        PermSalesCardsStop, RequirePermission,
    },
    models::sales_card::{
        SalesCardDetail, SalesCardQuery, SalesCardSummary, StartSalesCardPayload, StopSalesCardPayload,
        UpdateSalesCardPayload,
    },
};

// GET /api/companies/{company_id}/sales-cards
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/sales-cards",
    tag = "Sales Cards",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), SalesCardQuery),
    responses(
        (status = 200, body = Vec<SalesCardSummary>),
        (status = 400, description = "Filtro de data inválido"),
        (status = 403, description = "Requer salesCards.read")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_cards(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSalesCardsRead>,
    Query(query): Query<SalesCardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let cards = app_state
        .sales_card_service
        .list_cards(guard.access.company_id, query)
        .await?;
    Ok(Json(cards))
}

// GET /api/companies/{company_id}/sales-cards/active
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/sales-cards/active",
    tag = "Sales Cards",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Turno em rascunho do usuário, ou null", body = Option<SalesCardDetail>)),
    security(("api_jwt" = []))
)]
pub async fn active_card(
    State(app_state): State<AppState>,
    CompanyMember(access): CompanyMember,
) -> Result<impl IntoResponse, AppError> {
    let card = app_state.sales_card_service.active_card(&access).await?;
    Ok(Json(card))
}

// POST /api/companies/{company_id}/sales-cards
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/sales-cards",
    tag = "Sales Cards",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    request_body = StartSalesCardPayload,
    responses(
        (status = 201, description = "Turno iniciado (DRAFT)", body = SalesCardDetail),
        (status = 400, description = "Já existe um turno em andamento, cargo ou local inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_card(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSalesCardsCreate>,
    Json(payload): Json<StartSalesCardPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let card = app_state.sales_card_service.start_card(&guard.access, payload).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

// GET /api/companies/{company_id}/sales-cards/{card_id}
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/sales-cards/{card_id}",
    tag = "Sales Cards",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("card_id" = Uuid, Path, description = "ID do turno")
    ),
    responses((status = 200, body = SalesCardDetail), (status = 404, description = "Turno não encontrado")),
    security(("api_jwt" = []))
)]
pub async fn get_card(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSalesCardsRead>,
    Path((_company_id, card_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let card = app_state
        .sales_card_service
        .get_card(guard.access.company_id, card_id)
        .await?;
    Ok(Json(card))
}

// PATCH /api/companies/{company_id}/sales-cards/{card_id}
#[utoipa::path(
    patch,
    path = "/api/companies/{company_id}/sales-cards/{card_id}",
    tag = "Sales Cards",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("card_id" = Uuid, Path, description = "ID do turno")
    ),
    request_body = UpdateSalesCardPayload,
    responses(
        (status = 200, description = "Observação e/ou linhas substituídas", body = SalesCardDetail),
        (status = 400, description = "Turno travado, linhas inválidas"),
        (status = 403, description = "Turno de outra pessoa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_card(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSalesCardsEdit>,
    Path((_company_id, card_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateSalesCardPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let card = app_state
        .sales_card_service
        .update_card(&guard.access, card_id, payload)
        .await?;
    Ok(Json(card))
}

// POST /api/companies/{company_id}/sales-cards/{card_id}/stop
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/sales-cards/{card_id}/stop",
    tag = "Sales Cards",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("card_id" = Uuid, Path, description = "ID do turno")
    ),
    request_body = StopSalesCardPayload,
    responses(
        (status = 200, description = "Turno enviado (SUBMITTED), preços congelados", body = SalesCardDetail),
        (status = 400, description = "Turno não está em rascunho ou endAt inválido"),
        (status = 403, description = "Turno de outra pessoa")
    ),
    security(("api_jwt" = []))
)]
pub async fn stop_card(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSalesCardsStop>,
    Path((_company_id, card_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<StopSalesCardPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let card = app_state
        .sales_card_service
        .stop_card(&guard.access, card_id, payload)
        .await?;
    Ok(Json(card))
}

// POST /api/companies/{company_id}/sales-cards/{card_id}/lock
#[utoipa::path(
    post,
    path = "/api/companies/{company_id}/sales-cards/{card_id}/lock",
    tag = "Sales Cards",
    params(
        ("company_id" = Uuid, Path, description = "ID da empresa"),
        ("card_id" = Uuid, Path, description = "ID do turno")
    ),
    responses(
        (status = 200, description = "Turno travado (LOCKED)", body = SalesCardDetail),
        (status = 400, description = "Apenas turnos enviados podem ser travados")
    ),
    security(("api_jwt" = []))
)]
pub async fn lock_card(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermSalesCardsLock>,
    Path((_company_id, card_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let card = app_state
        .sales_card_service
        .lock_card(guard.access.company_id, card_id)
        .await?;
    Ok(Json(card))
}
