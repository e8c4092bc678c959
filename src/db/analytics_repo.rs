// src/db/analytics_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::analytics::{AnnualEntry, AnnualEntryPayload, CardTotals, KpiRow, SoldLine};
use crate::models::bank::BankMovement;

// Âncora do turno (endAt, senão startAt) em `[from, to]`, ambos opcionais
pub const ANCHOR_IN_RANGE: &str = "($2::timestamptz IS NULL OR COALESCE(sc.end_at, sc.start_at) >= $2) \
     AND ($3::timestamptz IS NULL OR COALESCE(sc.end_at, sc.start_at) <= $3)";

const ANNUAL_COLUMNS: &str = "id, company_id, entry_date, revenue, expenses, starting_capital, \
     total, items_sold, profit, note, created_at, updated_at";

// Somente leitura sobre os dados brutos: nada aqui é materializado.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // O instante de referência de um turno é o endAt (ou startAt, se ainda não houver)
    pub async fn kpis(
        &self,
        company_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<KpiRow, AppError> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(l.total), 0) AS revenue,
                   COALESCE(SUM(l.quantity_sold), 0)::BIGINT AS items_sold,
                   COUNT(DISTINCT sc.user_id) AS active_staff
            FROM sales_cards sc
            LEFT JOIN sales_card_lines l ON l.sales_card_id = sc.id
            WHERE sc.company_id = $1
              AND sc.status IN ('SUBMITTED', 'LOCKED')
              AND {ANCHOR_IN_RANGE}
            "#
        );
        let row = sqlx::query_as::<_, KpiRow>(&sql)
            .bind(company_id)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// Linhas de turnos encerrados com âncora em `[from, to]` (mesmo filtro dos KPIs).
    pub async fn sold_lines(
        &self,
        company_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SoldLine>, AppError> {
        let sql = format!(
            r#"
            SELECT COALESCE(sc.end_at, sc.start_at) AS anchor_at,
                   l.quantity_sold,
                   l.total,
                   i.cost_price
            FROM sales_card_lines l
            INNER JOIN sales_cards sc ON sc.id = l.sales_card_id
            INNER JOIN items i ON i.id = l.item_id
            WHERE sc.company_id = $1
              AND sc.status IN ('SUBMITTED', 'LOCKED')
              AND {ANCHOR_IN_RANGE}
            "#
        );
        let lines = sqlx::query_as::<_, SoldLine>(&sql)
            .bind(company_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Totais por turno encerrado que toca a janela `[from, to)`.
    pub async fn card_totals_overlapping(
        &self,
        company_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CardTotals>, AppError> {
        let cards = sqlx::query_as::<_, CardTotals>(
            r#"
            SELECT sc.start_at,
                   sc.end_at,
                   COALESCE(SUM(l.total), 0) AS revenue,
                   COALESCE(SUM(l.quantity_sold), 0)::BIGINT AS items_sold
            FROM sales_cards sc
            LEFT JOIN sales_card_lines l ON l.sales_card_id = sc.id
            WHERE sc.company_id = $1
              AND sc.status IN ('SUBMITTED', 'LOCKED')
              AND sc.start_at < $3
              AND COALESCE(sc.end_at, sc.start_at) >= $2
            GROUP BY sc.id
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(cards)
    }

    pub async fn movements_between(
        &self,
        company_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BankMovement>, AppError> {
        let movements = sqlx::query_as::<_, BankMovement>(
            r#"
            SELECT id, company_id, type, amount, restock_id, sales_card_id, note, created_at
            FROM company_bank_movements
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Saldo atual e soma dos lançamentos a partir de `since`, lidos juntos.
    pub async fn balance_and_movements_since(
        &self,
        company_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<(Decimal, Decimal), AppError> {
        let row = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT c.bank_balance,
                   COALESCE((
                       SELECT SUM(m.amount)
                       FROM company_bank_movements m
                       WHERE m.company_id = c.id AND m.created_at >= $2
                   ), 0)
            FROM companies c
            WHERE c.id = $1
            "#,
        )
        .bind(company_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // ---
    // Lançamentos anuais manuais
    // ---

    pub async fn list_annual_entries(
        &self,
        company_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AnnualEntry>, AppError> {
        let sql = format!(
            r#"
            SELECT {ANNUAL_COLUMNS}
            FROM annual_entries
            WHERE company_id = $1 AND entry_date >= $2 AND entry_date <= $3
            ORDER BY entry_date ASC
            "#
        );

        let entries = sqlx::query_as::<_, AnnualEntry>(&sql)
            .bind(company_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    // Um lançamento por (empresa, data): gravar de novo substitui
    pub async fn upsert_annual_entry(
        &self,
        company_id: Uuid,
        payload: &AnnualEntryPayload,
    ) -> Result<AnnualEntry, AppError> {
        let sql = format!(
            r#"
            INSERT INTO annual_entries
                (company_id, entry_date, revenue, expenses, starting_capital, total, items_sold, profit, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (company_id, entry_date) DO UPDATE SET
                revenue = EXCLUDED.revenue,
                expenses = EXCLUDED.expenses,
                starting_capital = EXCLUDED.starting_capital,
                total = EXCLUDED.total,
                items_sold = EXCLUDED.items_sold,
                profit = EXCLUDED.profit,
                note = EXCLUDED.note,
                updated_at = now()
            RETURNING {ANNUAL_COLUMNS}
            "#
        );

        let entry = sqlx::query_as::<_, AnnualEntry>(&sql)
            .bind(company_id)
            .bind(payload.date)
            .bind(payload.revenue)
            .bind(payload.expenses)
            .bind(payload.starting_capital)
            .bind(payload.total)
            .bind(payload.items_sold)
            .bind(payload.profit)
            .bind(payload.note.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    pub async fn delete_annual_entry(&self, company_id: Uuid, entry_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM annual_entries WHERE id = $1 AND company_id = $2")
            .bind(entry_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_filter_is_inclusive_on_both_ends() {
        assert!(ANCHOR_IN_RANGE.contains("COALESCE(sc.end_at, sc.start_at) >= $2"));
        assert!(ANCHOR_IN_RANGE.contains("COALESCE(sc.end_at, sc.start_at) <= $3"));
        assert!(!ANCHOR_IN_RANGE.contains("< $3"));
    }
}
