// src/models/bank.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "bank_movement_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankMovementType {
    SalesCard,
    Restock,
    OpeningBalance,
    Adjustment,
}

// Lançamento no livro-razão da empresa. Imutável depois de criado.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankMovement {
    pub id: Uuid,
    pub company_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub movement_type: BankMovementType,
    #[schema(value_type = f64, example = -10.00)]
    pub amount: Decimal,
    pub restock_id: Option<Uuid>,
    pub sales_card_id: Option<Uuid>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Dados de um novo lançamento.
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub movement_type: BankMovementType,
    pub amount: Decimal,
    pub restock_id: Option<Uuid>,
    pub sales_card_id: Option<Uuid>,
    pub note: Option<&'a str>,
    pub at: DateTime<Utc>,
}
