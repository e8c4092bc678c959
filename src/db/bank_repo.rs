// src/db/bank_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::bank::{BankMovement, NewMovement};

#[derive(Clone)]
pub struct BankRepository {
    pool: PgPool,
}

impl BankRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Incremento atômico: nunca sobrescrevemos o saldo com um valor lido antes.
    pub async fn increment_balance<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        amount: Decimal,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance: Decimal = sqlx::query_scalar(
            r#"
            UPDATE companies
            SET bank_balance = bank_balance + $2, updated_at = now()
            WHERE id = $1
            RETURNING bank_balance
            "#,
        )
        .bind(company_id)
        .bind(amount)
        .fetch_one(executor)
        .await?;

        Ok(balance)
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        movement: &NewMovement<'_>,
    ) -> Result<BankMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, BankMovement>(
            r#"
            INSERT INTO company_bank_movements
                (company_id, type, amount, restock_id, sales_card_id, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_id, type, amount, restock_id, sales_card_id, note, created_at
            "#,
        )
        .bind(company_id)
        .bind(movement.movement_type)
        .bind(movement.amount)
        .bind(movement.restock_id)
        .bind(movement.sales_card_id)
        .bind(movement.note)
        .bind(movement.at)
        .fetch_one(executor)
        .await?;

        Ok(created)
    }

    pub async fn list_movements(&self, company_id: Uuid) -> Result<Vec<BankMovement>, AppError> {
        let movements = sqlx::query_as::<_, BankMovement>(
            r#"
            SELECT id, company_id, type, amount, restock_id, sales_card_id, note, created_at
            FROM company_bank_movements
            WHERE company_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}
