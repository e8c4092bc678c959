// src/db/inventory_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::{db_utils::conflict_or_db, error::AppError};
use crate::models::inventory::{
    CreateItemPayload, InventorySnapshot, Item, ItemPricing, ItemQuery, Restock, RestockLineView,
    RestockSummary, SnapshotLineView, SnapshotSummary, StockItemRow, UpdateItemPayload,
};

const ITEM_COLUMNS: &str = "id, company_id, name, category, unit, base_price, cost_price, \
     low_stock_threshold, is_active, archived_at, created_at, updated_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura"
    // ---

    /// Lista os itens da empresa com filtros opcionais.
    pub async fn list_items(&self, company_id: Uuid, query: &ItemQuery) -> Result<Vec<Item>, AppError> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
            WHERE company_id = $1
              AND ($2::item_category IS NULL OR category = $2)
              AND (NOT $3 OR is_active)
              AND ($4 OR archived_at IS NULL)
              AND ($5::text IS NULL OR position(lower($5) IN lower(name)) > 0)
            ORDER BY name ASC
            "#
        );

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(company_id)
            .bind(query.category)
            .bind(query.active_only.unwrap_or(true))
            .bind(query.include_archived.unwrap_or(false))
            .bind(search)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn find_item<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<Item>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND company_id = $2 AND archived_at IS NULL"
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;

        Ok(item)
    }

    /// Resolve ids em itens não arquivados da empresa. Ids desconhecidos simplesmente não voltam.
    pub async fn find_items_by_ids<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        item_ids: &[Uuid],
        active_only: bool,
    ) -> Result<Vec<ItemPricing>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, ItemPricing>(
            r#"
            SELECT id, base_price, cost_price
            FROM items
            WHERE company_id = $1
              AND id = ANY($2)
              AND archived_at IS NULL
              AND (NOT $3 OR is_active)
            "#,
        )
        .bind(company_id)
        .bind(item_ids)
        .bind(active_only)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    /// Itens completos por id (inclusive arquivados), para resolver referências.
    pub async fn list_items_by_ids(&self, company_id: Uuid, item_ids: &[Uuid]) -> Result<Vec<Item>, AppError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE company_id = $1 AND id = ANY($2)");

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(company_id)
            .bind(item_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    pub async fn create_item<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        payload: &CreateItemPayload,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO items (company_id, name, category, unit, base_price, cost_price, low_stock_threshold)
            VALUES ($1, $2, COALESCE($3, 'OTHER'::item_category), $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Item>(&sql)
            .bind(company_id)
            .bind(&payload.name)
            .bind(payload.category)
            .bind(&payload.unit)
            .bind(payload.base_price)
            .bind(payload.cost_price)
            .bind(payload.low_stock_threshold)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Já existe um item com este nome."))
    }

    /// Atualização parcial. Para os campos anuláveis, o par (flag, valor) decide
    /// entre manter o atual e gravar o novo (inclusive NULL).
    pub async fn update_item<'e, E>(
        &self,
        executor: E,
        item_id: Uuid,
        payload: &UpdateItemPayload,
    ) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                unit = COALESCE($4, unit),
                base_price = CASE WHEN $5 THEN $6 ELSE base_price END,
                cost_price = CASE WHEN $7 THEN $8 ELSE cost_price END,
                low_stock_threshold = CASE WHEN $9 THEN $10 ELSE low_stock_threshold END,
                is_active = COALESCE($11, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .bind(payload.name.as_deref())
            .bind(payload.category)
            .bind(payload.unit.as_deref())
            .bind(payload.base_price.is_some())
            .bind(payload.base_price.flatten())
            .bind(payload.cost_price.is_some())
            .bind(payload.cost_price.flatten())
            .bind(payload.low_stock_threshold.is_some())
            .bind(payload.low_stock_threshold.flatten())
            .bind(payload.is_active)
            .fetch_one(executor)
            .await
            .map_err(|e| conflict_or_db(e, "Já existe um item com este nome."))
    }

    pub async fn archive_item<'e, E>(&self, executor: E, item_id: Uuid) -> Result<Item, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE items
            SET archived_at = now(), is_active = false, updated_at = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item_id)
            .fetch_one(executor)
            .await?;

        Ok(item)
    }

    // ---
    // Contagens (snapshots)
    // ---

    pub async fn create_snapshot<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        created_by_id: Uuid,
        note: Option<&str>,
    ) -> Result<InventorySnapshot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let snapshot = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            INSERT INTO inventory_snapshots (company_id, created_by_id, note)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, created_by_id, note, created_at
            "#,
        )
        .bind(company_id)
        .bind(created_by_id)
        .bind(note)
        .fetch_one(executor)
        .await?;

        Ok(snapshot)
    }

    // Inserção em massa usando UNNEST
    pub async fn insert_snapshot_lines<'e, E>(
        &self,
        executor: E,
        snapshot_id: Uuid,
        item_ids: &[Uuid],
        quantities: &[i32],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO inventory_snapshot_lines (snapshot_id, item_id, quantity)
            SELECT $1, t.item_id, t.quantity
            FROM UNNEST($2::uuid[], $3::int4[]) AS t(item_id, quantity)
            "#,
        )
        .bind(snapshot_id)
        .bind(item_ids)
        .bind(quantities)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_snapshots(&self, company_id: Uuid) -> Result<Vec<SnapshotSummary>, AppError> {
        let snapshots = sqlx::query_as::<_, SnapshotSummary>(
            r#"
            SELECT s.id, s.company_id, s.created_by_id, s.note, s.created_at,
                   COUNT(l.id) AS line_count
            FROM inventory_snapshots s
            LEFT JOIN inventory_snapshot_lines l ON l.snapshot_id = s.id
            WHERE s.company_id = $1
            GROUP BY s.id
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots)
    }

    pub async fn find_snapshot(
        &self,
        company_id: Uuid,
        snapshot_id: Uuid,
    ) -> Result<Option<InventorySnapshot>, AppError> {
        let snapshot = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT id, company_id, created_by_id, note, created_at
            FROM inventory_snapshots
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(snapshot_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Contagem mais recente da empresa (base do estoque calculado).
    pub async fn latest_snapshot(&self, company_id: Uuid) -> Result<Option<InventorySnapshot>, AppError> {
        let snapshot = sqlx::query_as::<_, InventorySnapshot>(
            r#"
            SELECT id, company_id, created_by_id, note, created_at
            FROM inventory_snapshots
            WHERE company_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    pub async fn list_snapshot_lines(&self, snapshot_id: Uuid) -> Result<Vec<SnapshotLineView>, AppError> {
        let lines = sqlx::query_as::<_, SnapshotLineView>(
            r#"
            SELECT l.id, l.item_id, i.name AS item_name, i.unit AS item_unit,
                   i.category AS item_category, l.quantity
            FROM inventory_snapshot_lines l
            INNER JOIN items i ON i.id = l.item_id
            WHERE l.snapshot_id = $1
            ORDER BY i.name ASC
            "#,
        )
        .bind(snapshot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // ---
    // Reposições (restocks)
    // ---

    pub async fn create_restock<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        created_by_id: Uuid,
        note: Option<&str>,
        total_cost: Decimal,
    ) -> Result<Restock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let restock = sqlx::query_as::<_, Restock>(
            r#"
            INSERT INTO restocks (company_id, created_by_id, note, total_cost)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, created_by_id, note, total_cost, created_at
            "#,
        )
        .bind(company_id)
        .bind(created_by_id)
        .bind(note)
        .bind(total_cost)
        .fetch_one(executor)
        .await?;

        Ok(restock)
    }

    pub async fn insert_restock_lines<'e, E>(
        &self,
        executor: E,
        restock_id: Uuid,
        item_ids: &[Uuid],
        quantities: &[i32],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO restock_lines (restock_id, item_id, quantity_added)
            SELECT $1, t.item_id, t.quantity_added
            FROM UNNEST($2::uuid[], $3::int4[]) AS t(item_id, quantity_added)
            "#,
        )
        .bind(restock_id)
        .bind(item_ids)
        .bind(quantities)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_restocks(&self, company_id: Uuid) -> Result<Vec<RestockSummary>, AppError> {
        let restocks = sqlx::query_as::<_, RestockSummary>(
            r#"
            SELECT r.id, r.company_id, r.created_by_id, r.note, r.total_cost, r.created_at,
                   COUNT(l.id) AS line_count
            FROM restocks r
            LEFT JOIN restock_lines l ON l.restock_id = r.id
            WHERE r.company_id = $1
            GROUP BY r.id
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(restocks)
    }

    pub async fn find_restock(&self, company_id: Uuid, restock_id: Uuid) -> Result<Option<Restock>, AppError> {
        let restock = sqlx::query_as::<_, Restock>(
            r#"
            SELECT id, company_id, created_by_id, note, total_cost, created_at
            FROM restocks
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(restock_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(restock)
    }

    pub async fn list_restock_lines(&self, restock_id: Uuid) -> Result<Vec<RestockLineView>, AppError> {
        let lines = sqlx::query_as::<_, RestockLineView>(
            r#"
            SELECT l.id, l.item_id, i.name AS item_name, i.unit AS item_unit,
                   i.category AS item_category, l.quantity_added, i.cost_price
            FROM restock_lines l
            INNER JOIN items i ON i.id = l.item_id
            WHERE l.restock_id = $1
            ORDER BY i.name ASC
            "#,
        )
        .bind(restock_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // ---
    // Estoque calculado
    // ---

    pub async fn list_stock_items(&self, company_id: Uuid) -> Result<Vec<StockItemRow>, AppError> {
        let items = sqlx::query_as::<_, StockItemRow>(
            r#"
            SELECT id, name, unit, category, low_stock_threshold
            FROM items
            WHERE company_id = $1 AND archived_at IS NULL AND is_active
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn snapshot_quantities(&self, snapshot_id: Uuid) -> Result<Vec<(Uuid, i32)>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT item_id, quantity FROM inventory_snapshot_lines WHERE snapshot_id = $1",
        )
        .bind(snapshot_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Quantidade vendida por item em turnos encerrados iniciados a partir de `since`
    /// (ou desde sempre, sem contagem base).
    pub async fn sold_since(
        &self,
        company_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<(Uuid, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT l.item_id, COALESCE(SUM(l.quantity_sold), 0)::BIGINT
            FROM sales_card_lines l
            INNER JOIN sales_cards sc ON sc.id = l.sales_card_id
            WHERE sc.company_id = $1
              AND sc.status IN ('SUBMITTED', 'LOCKED')
              AND ($2::timestamptz IS NULL OR sc.start_at >= $2)
            GROUP BY l.item_id
            "#,
        )
        .bind(company_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
