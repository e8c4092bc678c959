// src/db/company_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::conflict_or_db, error::AppError};
use crate::models::company::{Company, CompanyLocation, CompanyType};

const COMPANY_COLUMNS: &str =
    "id, name, slug, type, owner_id, bank_balance, archived_at, created_at, updated_at";

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Criar a empresa (saldo começa em zero; o saldo inicial entra como lançamento)
    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        name: &str,
        slug: &str,
        company_type: CompanyType,
        owner_id: Uuid,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO companies (name, slug, type, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMPANY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Company>(&sql)
            .bind(name)
            .bind(slug)
            .bind(company_type)
            .bind(owner_id)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Já existe uma empresa com este slug."))
    }

    // 2. Verifica se um slug já está em uso (inclusive por empresas arquivadas)
    pub async fn slug_exists<'e, E>(&self, executor: E, slug: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM companies WHERE slug = $1)")
                .bind(slug)
                .fetch_one(executor)
                .await?;

        Ok(exists)
    }

    pub async fn find_company<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1 AND archived_at IS NULL");

        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;

        Ok(company)
    }

    // 3. Empresas onde o usuário tem associação ativa
    pub async fn list_companies_for_user(&self, user_id: Uuid) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT c.id, c.name, c.slug, c.type, c.owner_id, c.bank_balance,
                   c.archived_at, c.created_at, c.updated_at
            FROM companies c
            INNER JOIN memberships m ON m.company_id = c.id
            WHERE m.user_id = $1
              AND m.archived_at IS NULL
              AND c.archived_at IS NULL
            ORDER BY c.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    pub async fn update_company<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: Option<&str>,
        company_type: Option<CompanyType>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name),
                type = COALESCE($3, type),
                updated_at = now()
            WHERE id = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        );

        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(company_id)
            .bind(name)
            .bind(company_type)
            .fetch_one(executor)
            .await?;

        Ok(company)
    }

    // 4. Trava a linha da empresa e devolve o saldo atual
    pub async fn lock_bank_balance<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance: Decimal =
            sqlx::query_scalar("SELECT bank_balance FROM companies WHERE id = $1 FOR UPDATE")
                .bind(company_id)
                .fetch_one(executor)
                .await?;

        Ok(balance)
    }

    pub async fn archive_company<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE companies
            SET archived_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING {COMPANY_COLUMNS}
            "#
        );

        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(company_id)
            .fetch_one(executor)
            .await?;

        Ok(company)
    }

    // ---
    // Locais
    // ---

    pub async fn create_location<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
    ) -> Result<CompanyLocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CompanyLocation>(
            r#"
            INSERT INTO company_locations (company_id, name)
            VALUES ($1, $2)
            RETURNING id, company_id, name, archived_at, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_or_db(e, "Já existe um local com este nome."))
    }

    pub async fn list_locations(&self, company_id: Uuid) -> Result<Vec<CompanyLocation>, AppError> {
        let locations = sqlx::query_as::<_, CompanyLocation>(
            r#"
            SELECT id, company_id, name, archived_at, created_at, updated_at
            FROM company_locations
            WHERE company_id = $1 AND archived_at IS NULL
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    pub async fn find_location<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<CompanyLocation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, CompanyLocation>(
            r#"
            SELECT id, company_id, name, archived_at, created_at, updated_at
            FROM company_locations
            WHERE id = $1 AND company_id = $2 AND archived_at IS NULL
            "#,
        )
        .bind(location_id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(location)
    }

    pub async fn rename_location<'e, E>(
        &self,
        executor: E,
        location_id: Uuid,
        name: &str,
    ) -> Result<CompanyLocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CompanyLocation>(
            r#"
            UPDATE company_locations
            SET name = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, company_id, name, archived_at, created_at, updated_at
            "#,
        )
        .bind(location_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_or_db(e, "Já existe um local com este nome."))
    }

    pub async fn archive_location<'e, E>(
        &self,
        executor: E,
        location_id: Uuid,
    ) -> Result<CompanyLocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, CompanyLocation>(
            r#"
            UPDATE company_locations
            SET archived_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING id, company_id, name, archived_at, created_at, updated_at
            "#,
        )
        .bind(location_id)
        .fetch_one(executor)
        .await?;

        Ok(location)
    }
}
