// src/models/menu.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    pub item_id: Option<Uuid>,
    pub name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuEntryKind {
    Item,
    Custom,
}

// Entrada já resolvida: nome/preço vêm do item quando houver referência
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntryView {
    pub id: Uuid,
    pub kind: MenuEntryKind,
    pub item_id: Option<Uuid>,
    pub name: String,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuEntryPayload {
    pub item_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "O nome não pode ser vazio."))]
    pub name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}
