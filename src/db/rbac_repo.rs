// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::conflict_or_db, error::AppError};
use crate::models::rbac::{AccessRow, CompanyRole, MemberRoleRow, MemberRow, Membership};

const ROLE_COLUMNS: &str =
    "id, company_id, name, key, permissions, is_system, archived_at, created_at, updated_at";
const MEMBERSHIP_COLUMNS: &str =
    "id, company_id, user_id, active_role_id, archived_at, created_at, updated_at";

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Snapshot de acesso: associação + empresa + todos os cargos vinculados, numa leitura só
    // ---
    pub async fn load_access_rows(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<Vec<AccessRow>, AppError> {
        let rows = sqlx::query_as::<_, AccessRow>(
            r#"
            SELECT m.id AS membership_id,
                   m.active_role_id,
                   c.owner_id,
                   c.archived_at AS company_archived_at,
                   r.id AS role_id,
                   r.name AS role_name,
                   r.permissions AS role_permissions,
                   r.archived_at AS role_archived_at
            FROM memberships m
            INNER JOIN companies c ON c.id = m.company_id
            LEFT JOIN membership_roles mr ON mr.membership_id = m.id
            LEFT JOIN company_roles r ON r.id = mr.role_id
            WHERE m.user_id = $1
              AND m.company_id = $2
              AND m.archived_at IS NULL
            ORDER BY r.name ASC NULLS LAST
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ---
    // Cargos
    // ---

    // 1. Criar o Cargo
    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        key: &str,
        permissions: &[String],
        is_system: bool,
    ) -> Result<CompanyRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO company_roles (company_id, name, key, permissions, is_system)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ROLE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, CompanyRole>(&sql)
            .bind(company_id)
            .bind(name)
            .bind(key)
            .bind(permissions)
            .bind(is_system)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Já existe um cargo com esta chave."))
    }

    // 2. Listar cargos ativos (cargos de sistema primeiro)
    pub async fn list_roles(&self, company_id: Uuid) -> Result<Vec<CompanyRole>, AppError> {
        let sql = format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM company_roles
            WHERE company_id = $1 AND archived_at IS NULL
            ORDER BY is_system DESC, created_at ASC
            "#
        );

        let roles = sqlx::query_as::<_, CompanyRole>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    pub async fn find_role<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        role_id: Uuid,
    ) -> Result<Option<CompanyRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {ROLE_COLUMNS} FROM company_roles WHERE id = $1 AND company_id = $2 AND archived_at IS NULL"
        );

        let role = sqlx::query_as::<_, CompanyRole>(&sql)
            .bind(role_id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;

        Ok(role)
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        name: Option<&str>,
        permissions: Option<&[String]>,
    ) -> Result<CompanyRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE company_roles
            SET name = COALESCE($2, name),
                permissions = COALESCE($3, permissions),
                updated_at = now()
            WHERE id = $1
            RETURNING {ROLE_COLUMNS}
            "#
        );

        let role = sqlx::query_as::<_, CompanyRole>(&sql)
            .bind(role_id)
            .bind(name)
            .bind(permissions)
            .fetch_one(executor)
            .await?;

        Ok(role)
    }

    pub async fn archive_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<CompanyRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE company_roles
            SET archived_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING {ROLE_COLUMNS}
            "#
        );

        let role = sqlx::query_as::<_, CompanyRole>(&sql)
            .bind(role_id)
            .fetch_one(executor)
            .await?;

        Ok(role)
    }

    // Quem estava com o cargo arquivado como ativo fica sem cargo ativo
    pub async fn clear_active_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE memberships SET active_role_id = NULL, updated_at = now() WHERE active_role_id = $1",
        )
        .bind(role_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    // ---
    // Associações
    // ---

    pub async fn create_membership<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        active_role_id: Option<Uuid>,
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO memberships (company_id, user_id, active_role_id)
            VALUES ($1, $2, $3)
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Membership>(&sql)
            .bind(company_id)
            .bind(user_id)
            .bind(active_role_id)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Você já é membro desta empresa."))
    }

    pub async fn add_membership_role<'e, E>(
        &self,
        executor: E,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO membership_roles (membership_id, role_id) VALUES ($1, $2)")
            .bind(membership_id)
            .bind(role_id)
            .execute(executor)
            .await
            .map_err(|e| conflict_or_db(e, "O membro já possui este cargo."))?;

        Ok(())
    }

    pub async fn remove_membership_role<'e, E>(
        &self,
        executor: E,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM membership_roles WHERE membership_id = $1 AND role_id = $2")
            .bind(membership_id)
            .bind(role_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_membership_by_user<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE company_id = $1 AND user_id = $2 AND archived_at IS NULL"
        );

        let membership = sqlx::query_as::<_, Membership>(&sql)
            .bind(company_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(membership)
    }

    pub async fn find_membership<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Option<Membership>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE id = $1 AND company_id = $2 AND archived_at IS NULL"
        );

        let membership = sqlx::query_as::<_, Membership>(&sql)
            .bind(membership_id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;

        Ok(membership)
    }

    // Cargos ativos de uma ou mais associações (em ordem alfabética)
    pub async fn list_membership_roles<'e, E>(
        &self,
        executor: E,
        membership_ids: &[Uuid],
    ) -> Result<Vec<MemberRoleRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, MemberRoleRow>(
            r#"
            SELECT mr.membership_id, r.id AS role_id, r.name, r.key, r.permissions, r.is_system
            FROM membership_roles mr
            INNER JOIN company_roles r ON r.id = mr.role_id
            WHERE mr.membership_id = ANY($1)
              AND r.archived_at IS NULL
            ORDER BY r.name ASC
            "#,
        )
        .bind(membership_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn set_active_role<'e, E>(
        &self,
        executor: E,
        membership_id: Uuid,
        active_role_id: Option<Uuid>,
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE memberships
            SET active_role_id = $2, updated_at = now()
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );

        let membership = sqlx::query_as::<_, Membership>(&sql)
            .bind(membership_id)
            .bind(active_role_id)
            .fetch_one(executor)
            .await?;

        Ok(membership)
    }

    pub async fn archive_membership<'e, E>(
        &self,
        executor: E,
        membership_id: Uuid,
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE memberships
            SET archived_at = now(), active_role_id = NULL, updated_at = now()
            WHERE id = $1
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        );

        let membership = sqlx::query_as::<_, Membership>(&sql)
            .bind(membership_id)
            .fetch_one(executor)
            .await?;

        Ok(membership)
    }

    pub async fn list_members(&self, company_id: Uuid) -> Result<Vec<MemberRow>, AppError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT m.id AS membership_id, m.user_id, u.email, u.name,
                   m.active_role_id, m.created_at
            FROM memberships m
            INNER JOIN users u ON u.id = m.user_id
            WHERE m.company_id = $1 AND m.archived_at IS NULL
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
