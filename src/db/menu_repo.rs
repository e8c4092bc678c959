// src/db/menu_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::conflict_or_db, error::AppError};
use crate::models::menu::MenuEntry;

const MENU_COLUMNS: &str = "id, company_id, item_id, name, price, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct MenuRepository {
    pool: PgPool,
}

impl MenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_entries(&self, company_id: Uuid) -> Result<Vec<MenuEntry>, AppError> {
        let sql = format!(
            "SELECT {MENU_COLUMNS} FROM menu_entries WHERE company_id = $1 ORDER BY created_at ASC"
        );

        let entries = sqlx::query_as::<_, MenuEntry>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn create_entry<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        item_id: Option<Uuid>,
        name: Option<&str>,
        price: Option<Decimal>,
    ) -> Result<MenuEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO menu_entries (company_id, item_id, name, price)
            VALUES ($1, $2, $3, $4)
            RETURNING {MENU_COLUMNS}
            "#
        );

        sqlx::query_as::<_, MenuEntry>(&sql)
            .bind(company_id)
            .bind(item_id)
            .bind(name)
            .bind(price)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Este item já está no cardápio."))
    }

    pub async fn delete_entry(&self, company_id: Uuid, entry_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM menu_entries WHERE id = $1 AND company_id = $2")
            .bind(entry_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
