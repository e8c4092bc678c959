// src/db/sales_card_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::unique_violation, error::AppError};
use crate::models::sales_card::{
    LineForPricing, SalesCard, SalesCardLineView, SalesCardStatus, SalesCardSummary,
};

const CARD_COLUMNS: &str = "id, company_id, user_id, role_id, location_id, status, start_at, \
     end_at, note, created_at, updated_at";

pub const ACTIVE_CARD_MESSAGE: &str = "Você já tem um turno em andamento.";

/// Filtros da listagem (já validados)
#[derive(Debug, Default, Clone)]
pub struct SalesCardFilter {
    pub status: Option<SalesCardStatus>,
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct SalesCardRepository {
    pool: PgPool,
}

impl SalesCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_draft_for_user<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SalesCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {CARD_COLUMNS}
            FROM sales_cards
            WHERE company_id = $1 AND user_id = $2 AND status = 'DRAFT'
            "#
        );

        let card = sqlx::query_as::<_, SalesCard>(&sql)
            .bind(company_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(card)
    }

    // O índice parcial `sales_cards_one_draft_key` fecha a corrida entre dois "start" simultâneos
    pub async fn create_card<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
        location_id: Option<Uuid>,
        start_at: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<SalesCard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO sales_cards (company_id, user_id, role_id, location_id, start_at, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CARD_COLUMNS}
            "#
        );

        sqlx::query_as::<_, SalesCard>(&sql)
            .bind(company_id)
            .bind(user_id)
            .bind(role_id)
            .bind(location_id)
            .bind(start_at)
            .bind(note)
            .fetch_one(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::bad_request(ACTIVE_CARD_MESSAGE),
                None => AppError::DatabaseError(e),
            })
    }

    pub async fn find_card<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        card_id: Uuid,
    ) -> Result<Option<SalesCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {CARD_COLUMNS} FROM sales_cards WHERE id = $1 AND company_id = $2");

        let card = sqlx::query_as::<_, SalesCard>(&sql)
            .bind(card_id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;

        Ok(card)
    }

    // Trava a linha do turno até o fim da transação
    pub async fn lock_card<'e, E>(&self, executor: E, card_id: Uuid) -> Result<SalesCard, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {CARD_COLUMNS} FROM sales_cards WHERE id = $1 FOR UPDATE");

        let card = sqlx::query_as::<_, SalesCard>(&sql)
            .bind(card_id)
            .fetch_one(executor)
            .await?;

        Ok(card)
    }

    pub async fn list_cards(
        &self,
        company_id: Uuid,
        filter: &SalesCardFilter,
    ) -> Result<Vec<SalesCardSummary>, AppError> {
        let cards = sqlx::query_as::<_, SalesCardSummary>(
            r#"
            SELECT sc.id, sc.company_id, sc.user_id, sc.role_id, sc.location_id, sc.status,
                   sc.start_at, sc.end_at, sc.note, sc.created_at, sc.updated_at,
                   u.email AS user_email,
                   r.name AS role_name,
                   loc.name AS location_name,
                   COUNT(l.id) AS line_count,
                   COALESCE(SUM(l.total), 0) AS revenue
            FROM sales_cards sc
            INNER JOIN users u ON u.id = sc.user_id
            INNER JOIN company_roles r ON r.id = sc.role_id
            LEFT JOIN company_locations loc ON loc.id = sc.location_id
            LEFT JOIN sales_card_lines l ON l.sales_card_id = sc.id
            WHERE sc.company_id = $1
              AND ($2::sales_card_status IS NULL OR sc.status = $2)
              AND ($3::uuid IS NULL OR sc.user_id = $3)
              AND ($4::timestamptz IS NULL OR sc.start_at >= $4)
              AND ($5::timestamptz IS NULL OR sc.start_at <= $5)
            GROUP BY sc.id, u.email, r.name, loc.name
            ORDER BY sc.start_at DESC
            "#,
        )
        .bind(company_id)
        .bind(filter.status)
        .bind(filter.user_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    pub async fn list_lines<'e, E>(&self, executor: E, card_id: Uuid) -> Result<Vec<SalesCardLineView>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, SalesCardLineView>(
            r#"
            SELECT l.id, l.item_id, i.name AS item_name, i.unit AS item_unit,
                   i.category AS item_category, l.quantity_sold, l.unit_price, l.total
            FROM sales_card_lines l
            INNER JOIN items i ON i.id = l.item_id
            WHERE l.sales_card_id = $1
            ORDER BY i.name ASC
            "#,
        )
        .bind(card_id)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn update_note<'e, E>(&self, executor: E, card_id: Uuid, note: Option<&str>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sales_cards SET note = $2, updated_at = now() WHERE id = $1")
            .bind(card_id)
            .bind(note)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn touch<'e, E>(&self, executor: E, card_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sales_cards SET updated_at = now() WHERE id = $1")
            .bind(card_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn delete_lines<'e, E>(&self, executor: E, card_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM sales_card_lines WHERE sales_card_id = $1")
            .bind(card_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    // Preços ficam nulos até o encerramento
    pub async fn insert_lines<'e, E>(
        &self,
        executor: E,
        card_id: Uuid,
        item_ids: &[Uuid],
        quantities: &[i32],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO sales_card_lines (sales_card_id, item_id, quantity_sold)
            SELECT $1, t.item_id, t.quantity_sold
            FROM UNNEST($2::uuid[], $3::int4[]) AS t(item_id, quantity_sold)
            "#,
        )
        .bind(card_id)
        .bind(item_ids)
        .bind(quantities)
        .execute(executor)
        .await?;

        Ok(())
    }

    // Linhas com o preço base atual do item
    pub async fn lines_for_pricing<'e, E>(&self, executor: E, card_id: Uuid) -> Result<Vec<LineForPricing>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, LineForPricing>(
            r#"
            SELECT l.id, l.item_id, l.quantity_sold, i.base_price
            FROM sales_card_lines l
            INNER JOIN items i ON i.id = l.item_id
            WHERE l.sales_card_id = $1
            "#,
        )
        .bind(card_id)
        .fetch_all(executor)
        .await?;

        Ok(lines)
    }

    pub async fn set_line_price<'e, E>(
        &self,
        executor: E,
        line_id: Uuid,
        unit_price: Option<Decimal>,
        total: Option<Decimal>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sales_card_lines SET unit_price = $2, total = $3 WHERE id = $1")
            .bind(line_id)
            .bind(unit_price)
            .bind(total)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Transição condicional de status. Nenhuma linha afetada = outro pedido chegou antes.
    pub async fn transition<'e, E>(
        &self,
        executor: E,
        card_id: Uuid,
        from: SalesCardStatus,
        to: SalesCardStatus,
        end_at: Option<DateTime<Utc>>,
    ) -> Result<Option<SalesCard>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE sales_cards
            SET status = $3,
                end_at = COALESCE($4, end_at),
                updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {CARD_COLUMNS}
            "#
        );

        let card = sqlx::query_as::<_, SalesCard>(&sql)
            .bind(card_id)
            .bind(from)
            .bind(to)
            .bind(end_at)
            .fetch_optional(executor)
            .await?;

        Ok(card)
    }
}
