// src/handlers/stats.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermStatsRead, RequirePermission},
    models::{
        analytics::{
            DayBucket, HourBucket, Kpis, MonthBucket, RangeQuery, SalesBuckets, SalesQuery, TimeseriesPoint,
            TimeseriesQuery,
        },
        bank::BankMovement,
    },
};

// GET /api/companies/{company_id}/stats/kpis
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/kpis",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), RangeQuery),
    responses(
        (status = 200, description = "Receita, itens vendidos e equipe ativa no período", body = Kpis),
        (status = 400, description = "Período inválido"),
        (status = 403, description = "Requer stats.read")
    ),
    security(("api_jwt" = []))
)]
pub async fn kpis(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let kpis = app_state.analytics_service.kpis(guard.access.company_id, query).await?;
    Ok(Json(kpis))
}

// GET /api/companies/{company_id}/stats/sales-by-hour
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/sales-by-hour",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), RangeQuery),
    responses((status = 200, description = "24 posições, hora local", body = Vec<HourBucket>)),
    security(("api_jwt" = []))
)]
pub async fn sales_by_hour(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let buckets = app_state
        .analytics_service
        .sales_by_hour(guard.access.company_id, query)
        .await?;
    Ok(Json(buckets))
}

// GET /api/companies/{company_id}/stats/sales-by-day
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/sales-by-day",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), RangeQuery),
    responses((status = 200, description = "Um ponto por dia local (padrão: últimos 30)", body = Vec<DayBucket>)),
    security(("api_jwt" = []))
)]
pub async fn sales_by_day(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let buckets = app_state
        .analytics_service
        .sales_by_day(guard.access.company_id, query)
        .await?;
    Ok(Json(buckets))
}

// GET /api/companies/{company_id}/stats/sales-by-month
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/sales-by-month",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), RangeQuery),
    responses((status = 200, description = "Um ponto por mês local (padrão: últimos 12)", body = Vec<MonthBucket>)),
    security(("api_jwt" = []))
)]
pub async fn sales_by_month(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let buckets = app_state
        .analytics_service
        .sales_by_month(guard.access.company_id, query)
        .await?;
    Ok(Json(buckets))
}

// GET /api/companies/{company_id}/stats/sales
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/sales",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), SalesQuery),
    responses(
        (status = 200, body = SalesBuckets),
        (status = 400, description = "bucket inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn sales(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<SalesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let buckets = app_state.analytics_service.sales(guard.access.company_id, query).await?;
    Ok(Json(buckets))
}

// GET /api/companies/{company_id}/stats/sales-timeseries
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/sales-timeseries",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa"), TimeseriesQuery),
    responses(
        (status = 200, description = "Série por hora com rateio proporcional à duração dos turnos", body = Vec<TimeseriesPoint>),
        (status = 400, description = "interval inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn sales_timeseries(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
    Query(query): Query<TimeseriesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let points = app_state
        .analytics_service
        .sales_timeseries(guard.access.company_id, query)
        .await?;
    Ok(Json(points))
}

// GET /api/companies/{company_id}/stats/bank-movements
#[utoipa::path(
    get,
    path = "/api/companies/{company_id}/stats/bank-movements",
    tag = "Stats",
    params(("company_id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Livro-razão do caixa, mais recentes primeiro", body = Vec<BankMovement>)),
    security(("api_jwt" = []))
)]
pub async fn bank_movements(
    State(app_state): State<AppState>,
    guard: RequirePermission<PermStatsRead>,
) -> Result<impl IntoResponse, AppError> {
    let movements = app_state.bank_service.list_movements(guard.access.company_id).await?;
    Ok(Json(movements))
}
