// src/models/invite.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invite_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Expired,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: Uuid,
    pub company_id: Uuid,
    pub role_id: Uuid,
    #[schema(example = "joao@bar.com")]
    pub email: String,
    #[schema(example = "K7QX2M")]
    pub code: String,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub created_by_id: Uuid,
    pub accepted_by_id: Option<Uuid>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Convite + estado da empresa (para recusar convites de empresas arquivadas)
#[derive(Debug, Clone, FromRow)]
pub struct InviteLookup {
    #[sqlx(flatten)]
    pub invite: Invite,
    pub company_archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitePayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@bar.com")]
    pub email: String,
    pub role_id: Uuid,
    #[validate(range(min = 1, max = 8760, message = "A validade deve ser de pelo menos 1 hora."))]
    #[schema(example = 72)]
    pub expires_in_hours: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedInvite {
    pub company_id: Uuid,
    pub membership_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitePayload {
    #[validate(length(min = 1, max = 32, message = "O código do convite é obrigatório."))]
    #[schema(example = "K7QX2M")]
    pub code: String,
}
