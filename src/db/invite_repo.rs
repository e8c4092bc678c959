// src/db/invite_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::conflict_or_db, error::AppError};
use crate::models::invite::{Invite, InviteLookup};

const INVITE_COLUMNS: &str = "id, company_id, role_id, email, code, status, expires_at, \
     created_by_id, accepted_by_id, accepted_at, created_at";

#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Código repetido vira Conflict(fields = ["code"]); o serviço tenta de novo.
    pub async fn create_invite<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        role_id: Uuid,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
        created_by_id: Uuid,
    ) -> Result<Invite, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO invites (company_id, role_id, email, code, expires_at, created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {INVITE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Invite>(&sql)
            .bind(company_id)
            .bind(role_id)
            .bind(email)
            .bind(code)
            .bind(expires_at)
            .bind(created_by_id)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Não foi possível gerar um código de convite único."))
    }

    pub async fn list_invites(&self, company_id: Uuid) -> Result<Vec<Invite>, AppError> {
        let sql = format!(
            "SELECT {INVITE_COLUMNS} FROM invites WHERE company_id = $1 ORDER BY created_at DESC"
        );

        let invites = sqlx::query_as::<_, Invite>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invites)
    }

    pub async fn find_by_code<'e, E>(&self, executor: E, code: &str) -> Result<Option<InviteLookup>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lookup = sqlx::query_as::<_, InviteLookup>(
            r#"
            SELECT i.id, i.company_id, i.role_id, i.email, i.code, i.status, i.expires_at,
                   i.created_by_id, i.accepted_by_id, i.accepted_at, i.created_at,
                   c.archived_at AS company_archived_at
            FROM invites i
            INNER JOIN companies c ON c.id = i.company_id
            WHERE i.code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;

        Ok(lookup)
    }

    // Compare-and-swap: só aceita se ainda estiver PENDING. Retorna linhas afetadas.
    pub async fn mark_accepted<'e, E>(&self, executor: E, invite_id: Uuid, user_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE invites
            SET status = 'ACCEPTED', accepted_by_id = $2, accepted_at = now()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(invite_id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn mark_expired<'e, E>(&self, executor: E, invite_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE invites SET status = 'EXPIRED' WHERE id = $1 AND status = 'PENDING'")
            .bind(invite_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
