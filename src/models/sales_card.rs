// src/models/sales_card.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::inventory::ItemCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sales_card_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesCardStatus {
    Draft,
    Submitted,
    Locked,
}

// Um turno de vendas de um membro
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCard {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub location_id: Option<Uuid>,
    pub status: SalesCardStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCardSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub card: SalesCard,
    pub user_email: String,
    pub role_name: String,
    pub location_name: Option<String>,
    pub line_count: i64,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCardLineView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_unit: String,
    pub item_category: ItemCategory,
    pub quantity_sold: i32,
    // Congelados no encerramento do turno
    #[schema(value_type = Option<f64>)]
    pub unit_price: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub total: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCardDetail {
    #[serde(flatten)]
    pub card: SalesCard,
    pub lines: Vec<SalesCardLineView>,
}

// Linha com o preço atual do item (usada para congelar preços)
#[derive(Debug, Clone, FromRow)]
pub struct LineForPricing {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity_sold: i32,
    pub base_price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalesCardQuery {
    pub status: Option<SalesCardStatus>,
    pub user_id: Option<Uuid>,
    /// RFC 3339 ou YYYY-MM-DD, sobre `startAt`
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSalesCardPayload {
    pub role_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// RFC 3339; padrão: agora
    pub start_at: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCardLinePayload {
    pub item_id: Uuid,
    #[validate(range(min = 0, message = "A quantidade vendida não pode ser negativa."))]
    pub quantity_sold: i32,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalesCardPayload {
    #[validate(length(max = 500))]
    pub note: Option<String>,
    // Ausente = mantém as linhas; presente = substitui todas
    #[validate(length(max = 500, message = "Máximo de 500 linhas por turno."), nested)]
    pub lines: Option<Vec<SalesCardLinePayload>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopSalesCardPayload {
    /// RFC 3339; padrão: agora
    pub end_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_payload_validates_nested_lines() {
        let note_only: UpdateSalesCardPayload =
            serde_json::from_value(serde_json::json!({ "note": "Sem troco" })).unwrap();
        assert!(note_only.validate().is_ok());

        let cleared: UpdateSalesCardPayload = serde_json::from_value(serde_json::json!({ "lines": [] })).unwrap();
        assert!(cleared.validate().is_ok());

        let negative: UpdateSalesCardPayload = serde_json::from_value(serde_json::json!({
            "lines": [{ "itemId": Uuid::new_v4(), "quantitySold": -2 }]
        }))
        .unwrap();
        assert!(negative.validate().is_err());
    }
}
