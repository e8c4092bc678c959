// src/models/company.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::rbac::{CompanyRole, Membership};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "company_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompanyType {
    Bar,
    Club,
    FastFood,
    Other,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Bar do Zé")]
    pub name: String,
    #[schema(example = "bar-do-ze")]
    pub slug: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub company_type: CompanyType,
    pub owner_id: Uuid,
    #[schema(value_type = f64, example = 1500.00)]
    pub bank_balance: Decimal,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyLocation {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Balcão")]
    pub name: String,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resposta da criação: empresa + cargo Owner + associação do criador
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCompany {
    pub company: Company,
    pub owner_role: CompanyRole,
    pub membership: Membership,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "Bar do Zé")]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "O slug deve ter entre 1 e 64 caracteres."))]
    pub slug: Option<String>,
    #[serde(rename = "type")]
    pub company_type: Option<CompanyType>,
    #[schema(value_type = Option<f64>, example = 1500.00)]
    pub bank_balance: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da empresa não pode ser vazio."))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub company_type: Option<CompanyType>,
    // Novo saldo desejado; o sistema lança um ajuste com a diferença
    #[schema(value_type = Option<f64>)]
    pub bank_balance: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    #[validate(length(min = 1, max = 120, message = "O nome do local é obrigatório."))]
    #[schema(example = "Balcão")]
    pub name: String,
}
