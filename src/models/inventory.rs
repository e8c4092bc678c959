// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::double_option;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    Drink,
    SoftDrink,
    AlcoholDrink,
    Bottle,
    Food,
    Other,
}

// --- 1. Itens ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Cerveja Lata")]
    pub name: String,
    pub category: ItemCategory,
    #[schema(example = "un")]
    pub unit: String,
    #[schema(value_type = Option<f64>, example = 6.00)]
    pub base_price: Option<Decimal>,
    #[schema(value_type = Option<f64>, example = 2.50)]
    pub cost_price: Option<Decimal>,
    pub low_stock_threshold: Option<i32>,
    pub is_active: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    pub category: Option<ItemCategory>,
    /// Padrão: true
    pub active_only: Option<bool>,
    pub include_archived: Option<bool>,
    /// Busca por nome, sem diferenciar maiúsculas
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemPayload {
    #[validate(length(min = 1, max = 120, message = "O nome do item é obrigatório."))]
    #[schema(example = "Cerveja Lata")]
    pub name: String,
    pub category: Option<ItemCategory>,
    #[validate(length(min = 1, max = 20, message = "A unidade é obrigatória."))]
    #[schema(example = "un")]
    pub unit: String,
    #[schema(value_type = Option<f64>)]
    pub base_price: Option<Decimal>,
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Decimal>,
    #[validate(range(min = 0, message = "O limite de estoque baixo não pode ser negativo."))]
    pub low_stock_threshold: Option<i32>,
}

// Atualização parcial: campo ausente = mantém; `null` = limpa (preços e limite)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
    #[validate(length(min = 1, max = 120, message = "O nome do item não pode ser vazio."))]
    pub name: Option<String>,
    pub category: Option<ItemCategory>,
    #[validate(length(min = 1, max = 20, message = "A unidade não pode ser vazia."))]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub base_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub low_stock_threshold: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

// Referência compacta ao item numa linha
#[derive(Debug, Clone, FromRow)]
pub struct ItemPricing {
    pub id: Uuid,
    pub base_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
}

// --- 2. Contagens (snapshots) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub id: Uuid,
    pub company_id: Uuid,
    pub created_by_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub snapshot: InventorySnapshot,
    pub line_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLineView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_unit: String,
    pub item_category: ItemCategory,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDetail {
    #[serde(flatten)]
    pub snapshot: InventorySnapshot,
    pub lines: Vec<SnapshotLineView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLinePayload {
    pub item_id: Uuid,
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotPayload {
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Informe ao menos uma linha."), nested)]
    pub lines: Vec<SnapshotLinePayload>,
}

// --- 3. Reposições (restocks) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restock {
    pub id: Uuid,
    pub company_id: Uuid,
    pub created_by_id: Uuid,
    pub note: Option<String>,
    #[schema(value_type = f64, example = 10.00)]
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub restock: Restock,
    pub line_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockLineView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_unit: String,
    pub item_category: ItemCategory,
    pub quantity_added: i32,
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockDetail {
    #[serde(flatten)]
    pub restock: Restock,
    pub lines: Vec<RestockLineView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockLinePayload {
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade adicionada deve ser de pelo menos 1."))]
    pub quantity_added: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestockPayload {
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Informe ao menos uma linha."), nested)]
    pub lines: Vec<RestockLinePayload>,
}

// --- 4. Estoque calculado ---
#[derive(Debug, Clone, FromRow)]
pub struct StockItemRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: ItemCategory,
    pub low_stock_threshold: Option<i32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub item_id: Uuid,
    pub name: String,
    pub unit: String,
    pub category: ItemCategory,
    pub low_stock_threshold: Option<i32>,
    pub baseline_snapshot_id: Option<Uuid>,
    pub baseline_quantity: i64,
    pub sold_since_baseline: i64,
    pub current_stock: i64,
    pub is_low_stock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restock_payload_validates_lines() {
        let empty: CreateRestockPayload = serde_json::from_value(serde_json::json!({ "lines": [] })).unwrap();
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("lines"));

        let zero: CreateRestockPayload = serde_json::from_value(serde_json::json!({
            "lines": [{ "itemId": Uuid::new_v4(), "quantityAdded": 0 }]
        }))
        .unwrap();
        assert!(zero.validate().is_err());

        let ok: CreateRestockPayload = serde_json::from_value(serde_json::json!({
            "note": "Fornecedor",
            "lines": [{ "itemId": Uuid::new_v4(), "quantityAdded": 10 }]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_snapshot_payload_rejects_negative_quantity() {
        let negative: CreateSnapshotPayload = serde_json::from_value(serde_json::json!({
            "lines": [{ "itemId": Uuid::new_v4(), "quantity": -1 }]
        }))
        .unwrap();
        assert!(negative.validate().is_err());

        let counted: CreateSnapshotPayload = serde_json::from_value(serde_json::json!({
            "lines": [{ "itemId": Uuid::new_v4(), "quantity": 0 }]
        }))
        .unwrap();
        assert!(counted.validate().is_ok());
    }
}
