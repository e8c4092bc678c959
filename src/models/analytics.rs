// src/models/analytics.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// ---
// Parâmetros de consulta
// ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// RFC 3339 ou YYYY-MM-DD
    pub from: Option<String>,
    pub to: Option<String>,
    /// Minutos em relação ao UTC (ex.: -180)
    pub tz_offset_minutes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalesQuery {
    /// hour | day | month
    pub bucket: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tz_offset_minutes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TimeseriesQuery {
    /// Apenas `hour`
    pub interval: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub tz_offset_minutes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnnualQuery {
    /// 2000..=2100, padrão: ano corrente
    pub year: Option<String>,
    pub tz_offset_minutes: Option<String>,
}

// ---
// Linhas lidas do banco
// ---

#[derive(Debug, Clone, FromRow)]
pub struct KpiRow {
    pub revenue: Decimal,
    pub items_sold: i64,
    pub active_staff: i64,
}

// Uma linha de venda com o instante de referência do turno (endAt, ou startAt)
#[derive(Debug, Clone, FromRow)]
pub struct SoldLine {
    pub anchor_at: DateTime<Utc>,
    pub quantity_sold: i32,
    pub total: Option<Decimal>,
    pub cost_price: Option<Decimal>,
}

// Totais de um turno encerrado, para o rateio por hora
#[derive(Debug, Clone, FromRow)]
pub struct CardTotals {
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub revenue: Decimal,
    pub items_sold: i64,
}

// ---
// Respostas
// ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub items_sold: i64,
    pub active_staff: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    pub hour: u32,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub items_sold: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    #[schema(example = "2024-05-01")]
    pub day: String,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub items_sold: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    #[schema(example = "2024-05")]
    pub month: String,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
    pub items_sold: i64,
}

// Resposta do endpoint genérico `sales?bucket=`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SalesBuckets {
    Hour(Vec<HourBucket>),
    Day(Vec<DayBucket>),
    Month(Vec<MonthBucket>),
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesPoint {
    /// Início do intervalo (UTC)
    pub start: DateTime<Utc>,
    /// Rótulo no horário local, `YYYY-MM-DD HH:00`
    pub label: String,
    pub revenue: f64,
    pub items_sold: f64,
}

// ---
// Relatório anual
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnualSource {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnualEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    #[sqlx(rename = "entry_date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<f64>)]
    pub revenue: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub expenses: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub starting_capital: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total: Option<Decimal>,
    pub items_sold: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub profit: Option<Decimal>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnualRow {
    /// Id do lançamento manual; nulo em linhas automáticas
    pub id: Option<Uuid>,
    pub date: NaiveDate,
    #[schema(value_type = Option<f64>)]
    pub revenue: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub expenses: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub starting_capital: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total: Option<Decimal>,
    pub items_sold: Option<i64>,
    #[schema(value_type = Option<f64>)]
    pub profit: Option<Decimal>,
    pub note: Option<String>,
    pub source: AnnualSource,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnualEntryPayload {
    #[schema(value_type = String, example = "2024-05-01")]
    pub date: NaiveDate,
    #[schema(value_type = Option<f64>)]
    pub revenue: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub expenses: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub starting_capital: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total: Option<Decimal>,
    #[validate(range(min = 0, message = "Itens vendidos não pode ser negativo."))]
    pub items_sold: Option<i32>,
    #[schema(value_type = Option<f64>)]
    pub profit: Option<Decimal>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}
