// src/services/inventory_service.rs

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::InventoryRepository;
use crate::models::bank::{BankMovementType, NewMovement};
use crate::models::inventory::{
    CreateItemPayload, CreateRestockPayload, CreateSnapshotPayload, InventorySnapshot, Item, ItemPricing,
    ItemQuery, RestockDetail, RestockSummary, SnapshotDetail, SnapshotSummary, StockItemRow, StockRow,
    UpdateItemPayload,
};
use crate::services::bank_service::BankService;

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    bank_service: BankService,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(repo: InventoryRepository, bank_service: BankService, pool: PgPool) -> Self {
        Self { repo, bank_service, pool }
    }

    // ---
    // Itens
    // ---

    pub async fn list_items(&self, company_id: Uuid, query: ItemQuery) -> Result<Vec<Item>, AppError> {
        self.repo.list_items(company_id, &query).await
    }

    pub async fn create_item(&self, company_id: Uuid, mut payload: CreateItemPayload) -> Result<Item, AppError> {
        payload.name = payload.name.trim().to_string();
        payload.unit = payload.unit.trim().to_string();
        if payload.name.is_empty() || payload.unit.is_empty() {
            return Err(AppError::bad_request("Nome e unidade são obrigatórios."));
        }
        ensure_non_negative(&[payload.base_price, payload.cost_price])?;

        let item = self.repo.create_item(&self.pool, company_id, &payload).await?;
        tracing::info!(%company_id, item_id = %item.id, "📦 Item criado");
        Ok(item)
    }

    pub async fn update_item(
        &self,
        company_id: Uuid,
        item_id: Uuid,
        mut payload: UpdateItemPayload,
    ) -> Result<Item, AppError> {
        self.find_item(company_id, item_id).await?;

        payload.name = payload.name.map(|n| n.trim().to_string());
        payload.unit = payload.unit.map(|u| u.trim().to_string());
        if payload.name.as_deref() == Some("") || payload.unit.as_deref() == Some("") {
            return Err(AppError::bad_request("Nome e unidade não podem ser vazios."));
        }
        ensure_non_negative(&[payload.base_price.flatten(), payload.cost_price.flatten()])?;
        if payload.low_stock_threshold.flatten().is_some_and(|t| t < 0) {
            return Err(AppError::bad_request("O limite de estoque baixo não pode ser negativo."));
        }

        self.repo.update_item(&self.pool, item_id, &payload).await
    }

    pub async fn archive_item(&self, company_id: Uuid, item_id: Uuid) -> Result<Item, AppError> {
        self.find_item(company_id, item_id).await?;
        self.repo.archive_item(&self.pool, item_id).await
    }

    async fn find_item(&self, company_id: Uuid, item_id: Uuid) -> Result<Item, AppError> {
        self.repo
            .find_item(&self.pool, company_id, item_id)
            .await?
            .ok_or_else(|| AppError::not_found("Item não encontrado."))
    }

    // ---
    // Contagens
    // ---

    pub async fn create_snapshot(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        payload: CreateSnapshotPayload,
    ) -> Result<SnapshotDetail, AppError> {
        let item_ids = unique_item_ids(payload.lines.iter().map(|l| l.item_id))?;
        let quantities: Vec<i32> = payload.lines.iter().map(|l| l.quantity).collect();
        if quantities.iter().any(|q| *q < 0) {
            return Err(AppError::bad_request("A quantidade não pode ser negativa."));
        }

        let mut tx = self.pool.begin().await?;

        let found = self.repo.find_items_by_ids(&mut *tx, company_id, &item_ids, false).await?;
        ensure_all_resolved(&item_ids, &found)?;

        let snapshot = self
            .repo
            .create_snapshot(&mut *tx, company_id, user_id, clean_note(payload.note.as_deref()))
            .await?;
        self.repo
            .insert_snapshot_lines(&mut *tx, snapshot.id, &item_ids, &quantities)
            .await?;

        tx.commit().await?;

        tracing::info!(%company_id, snapshot_id = %snapshot.id, lines = item_ids.len(), "📋 Contagem registrada");
        self.get_snapshot(company_id, snapshot.id).await
    }

    pub async fn list_snapshots(&self, company_id: Uuid) -> Result<Vec<SnapshotSummary>, AppError> {
        self.repo.list_snapshots(company_id).await
    }

    pub async fn get_snapshot(&self, company_id: Uuid, snapshot_id: Uuid) -> Result<SnapshotDetail, AppError> {
        let snapshot = self
            .repo
            .find_snapshot(company_id, snapshot_id)
            .await?
            .ok_or_else(|| AppError::not_found("Contagem não encontrada."))?;
        let lines = self.repo.list_snapshot_lines(snapshot.id).await?;
        Ok(SnapshotDetail { snapshot, lines })
    }

    // ---
    // Reposições
    // ---

    /// Registra a reposição e, se houver custo, debita o saldo com um lançamento RESTOCK.
    pub async fn create_restock(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        payload: CreateRestockPayload,
    ) -> Result<RestockDetail, AppError> {
        let item_ids = unique_item_ids(payload.lines.iter().map(|l| l.item_id))?;
        let quantities: Vec<i32> = payload.lines.iter().map(|l| l.quantity_added).collect();
        if quantities.iter().any(|q| *q < 1) {
            return Err(AppError::bad_request("A quantidade adicionada deve ser de pelo menos 1."));
        }

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Resolve os itens (com o custo atual)
        let found = self.repo.find_items_by_ids(&mut *tx, company_id, &item_ids, false).await?;
        ensure_all_resolved(&item_ids, &found)?;

        let cost_by_item: HashMap<Uuid, Option<Decimal>> =
            found.iter().map(|i| (i.id, i.cost_price)).collect();
        let total_cost = restock_total_cost(
            item_ids
                .iter()
                .zip(&quantities)
                .map(|(id, qty)| (*qty, cost_by_item.get(id).copied().flatten())),
        );

        // 3. Cabeçalho + linhas
        let restock = self
            .repo
            .create_restock(&mut *tx, company_id, user_id, clean_note(payload.note.as_deref()), total_cost)
            .await?;
        self.repo
            .insert_restock_lines(&mut *tx, restock.id, &item_ids, &quantities)
            .await?;

        // 4. Débito no livro-razão (custo zero não gera lançamento)
        self.bank_service
            .post_movement(
                &mut tx,
                company_id,
                NewMovement {
                    movement_type: BankMovementType::Restock,
                    amount: -total_cost,
                    restock_id: Some(restock.id),
                    sales_card_id: None,
                    note: None,
                    at: restock.created_at,
                },
            )
            .await?;

        // 5. Commit
        tx.commit().await?;

        tracing::info!(%company_id, restock_id = %restock.id, total_cost = %total_cost, "🚚 Reposição registrada");
        self.get_restock(company_id, restock.id).await
    }

    pub async fn list_restocks(&self, company_id: Uuid) -> Result<Vec<RestockSummary>, AppError> {
        self.repo.list_restocks(company_id).await
    }

    pub async fn get_restock(&self, company_id: Uuid, restock_id: Uuid) -> Result<RestockDetail, AppError> {
        let restock = self
            .repo
            .find_restock(company_id, restock_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reposição não encontrada."))?;
        let lines = self.repo.list_restock_lines(restock.id).await?;
        Ok(RestockDetail { restock, lines })
    }

    // ---
    // Estoque calculado
    // ---

    pub async fn get_stock(&self, company_id: Uuid) -> Result<Vec<StockRow>, AppError> {
        let items = self.repo.list_stock_items(company_id).await?;
        let latest = self.repo.latest_snapshot(company_id).await?;

        let baseline = match &latest {
            Some(snapshot) => self.repo.snapshot_quantities(snapshot.id).await?.into_iter().collect(),
            None => HashMap::new(),
        };
        let sold: HashMap<Uuid, i64> = self
            .repo
            .sold_since(company_id, latest.as_ref().map(|s| s.created_at))
            .await?
            .into_iter()
            .collect();

        Ok(compute_stock(items, latest.as_ref(), &baseline, &sold))
    }
}

// ---
// Regras puras
// ---

/// Ids na ordem recebida; repetição é erro.
pub fn unique_item_ids(ids: impl Iterator<Item = Uuid>) -> Result<Vec<Uuid>, AppError> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AppError::bad_request(format!("Item repetido nas linhas: {id}")));
        }
        ordered.push(id);
    }
    if ordered.is_empty() {
        return Err(AppError::bad_request("Informe ao menos uma linha."));
    }
    Ok(ordered)
}

/// Todos os ids pedidos precisam ter sido encontrados na empresa.
pub fn ensure_all_resolved(requested: &[Uuid], found: &[ItemPricing]) -> Result<(), AppError> {
    let found: HashSet<Uuid> = found.iter().map(|i| i.id).collect();
    let missing: Vec<String> = requested
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "Itens inválidos para esta empresa: {}",
            missing.join(", ")
        )))
    }
}

/// Σ custo × quantidade; item sem custo conta como zero.
pub fn restock_total_cost(lines: impl Iterator<Item = (i32, Option<Decimal>)>) -> Decimal {
    lines
        .map(|(qty, cost)| cost.unwrap_or(Decimal::ZERO) * Decimal::from(qty))
        .sum()
}

pub fn compute_stock(
    items: Vec<StockItemRow>,
    baseline_snapshot: Option<&InventorySnapshot>,
    baseline: &HashMap<Uuid, i32>,
    sold: &HashMap<Uuid, i64>,
) -> Vec<StockRow> {
    items
        .into_iter()
        .map(|item| {
            let baseline_quantity = baseline.get(&item.id).copied().unwrap_or(0) as i64;
            let sold_since_baseline = sold.get(&item.id).copied().unwrap_or(0);
            let current_stock = baseline_quantity - sold_since_baseline;
            let is_low_stock = item
                .low_stock_threshold
                .is_some_and(|threshold| current_stock < threshold as i64);

            StockRow {
                item_id: item.id,
                name: item.name,
                unit: item.unit,
                category: item.category,
                low_stock_threshold: item.low_stock_threshold,
                baseline_snapshot_id: baseline_snapshot.map(|s| s.id),
                baseline_quantity,
                sold_since_baseline,
                current_stock,
                is_low_stock,
            }
        })
        .collect()
}

fn ensure_non_negative(prices: &[Option<Decimal>]) -> Result<(), AppError> {
    if prices.iter().flatten().any(|p| *p < Decimal::ZERO) {
        return Err(AppError::bad_request("Preços não podem ser negativos."));
    }
    Ok(())
}

pub(crate) fn clean_note(note: Option<&str>) -> Option<&str> {
    note.map(str::trim).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::ItemCategory;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn stock_item(threshold: Option<i32>) -> StockItemRow {
        StockItemRow {
            id: Uuid::new_v4(),
            name: "Cerveja".into(),
            unit: "un".into(),
            category: ItemCategory::AlcoholDrink,
            low_stock_threshold: threshold,
        }
    }

    #[test]
    fn test_duplicate_item_ids_are_rejected() {
        let id = Uuid::new_v4();
        assert!(unique_item_ids([id, Uuid::new_v4(), id].into_iter()).is_err());
        assert!(unique_item_ids(std::iter::empty()).is_err());
        assert_eq!(unique_item_ids([id].into_iter()).unwrap(), vec![id]);
    }

    #[test]
    fn test_unresolved_items_are_listed() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let found = vec![ItemPricing { id: known, base_price: None, cost_price: None }];
        let err = ensure_all_resolved(&[known, unknown], &found).unwrap_err();
        assert!(err.to_string().contains(&unknown.to_string()));
        assert!(ensure_all_resolved(&[known], &found).is_ok());
    }

    #[test]
    fn test_restock_cost_treats_missing_cost_as_zero() {
        let total = restock_total_cost(vec![(4, Some(dec("2.50"))), (3, None)].into_iter());
        assert_eq!(total, dec("10.00"));
        assert_eq!(restock_total_cost(vec![(5, None)].into_iter()), Decimal::ZERO);
    }

    #[test]
    fn test_stock_is_baseline_minus_sales() {
        let item = stock_item(Some(5));
        let id = item.id;
        let snapshot = InventorySnapshot {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            created_by_id: Uuid::new_v4(),
            note: None,
            created_at: Utc::now(),
        };
        let baseline = HashMap::from([(id, 10)]);
        let sold = HashMap::from([(id, 6i64)]);

        let rows = compute_stock(vec![item], Some(&snapshot), &baseline, &sold);
        assert_eq!(rows[0].baseline_quantity, 10);
        assert_eq!(rows[0].sold_since_baseline, 6);
        assert_eq!(rows[0].current_stock, 4);
        assert!(rows[0].is_low_stock);
        assert_eq!(rows[0].baseline_snapshot_id, Some(snapshot.id));
    }

    #[test]
    fn test_stock_without_snapshot_or_threshold() {
        let rows = compute_stock(vec![stock_item(None)], None, &HashMap::new(), &HashMap::new());
        assert_eq!(rows[0].current_stock, 0);
        assert!(!rows[0].is_low_stock);
        assert!(rows[0].baseline_snapshot_id.is_none());
    }

    #[test]
    fn test_low_stock_is_strictly_below_threshold() {
        let item = stock_item(Some(3));
        let id = item.id;
        let rows = compute_stock(vec![item], None, &HashMap::from([(id, 3)]), &HashMap::new());
        assert!(!rows[0].is_low_stock);
    }

    #[test]
    fn test_clean_note() {
        assert_eq!(clean_note(Some("  ")), None);
        assert_eq!(clean_note(Some(" ok ")), Some("ok"));
    }
}
