// src/services/menu_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{InventoryRepository, MenuRepository};
use crate::models::inventory::Item;
use crate::models::menu::{CreateMenuEntryPayload, MenuEntry, MenuEntryKind, MenuEntryView};

#[derive(Clone)]
pub struct MenuService {
    repo: MenuRepository,
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl MenuService {
    pub fn new(repo: MenuRepository, inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { repo, inventory_repo, pool }
    }

    pub async fn list_entries(&self, company_id: Uuid) -> Result<Vec<MenuEntryView>, AppError> {
        let entries = self.repo.list_entries(company_id).await?;

        let item_ids: Vec<Uuid> = entries.iter().filter_map(|e| e.item_id).collect();
        let items = if item_ids.is_empty() {
            Vec::new()
        } else {
            self.inventory_repo.list_items_by_ids(company_id, &item_ids).await?
        };

        Ok(resolve_entries(entries, &items))
    }

    pub async fn create_entry(
        &self,
        company_id: Uuid,
        payload: CreateMenuEntryPayload,
    ) -> Result<MenuEntryView, AppError> {
        let draft = classify_payload(&payload)?;

        let view = match draft {
            MenuDraft::Item(item_id) => {
                let item = self
                    .inventory_repo
                    .find_item(&self.pool, company_id, item_id)
                    .await?
                    .ok_or_else(|| AppError::bad_request("Item inválido para esta empresa."))?;

                let entry = self
                    .repo
                    .create_entry(&self.pool, company_id, Some(item.id), None, None)
                    .await?;
                resolve_entries(vec![entry], &[item])
            }
            MenuDraft::Custom { name, price } => {
                let entry = self
                    .repo
                    .create_entry(&self.pool, company_id, None, Some(name), Some(price))
                    .await?;
                resolve_entries(vec![entry], &[])
            }
        };

        let view = view
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("entrada de cardápio criada sem retorno"))?;

        tracing::info!(%company_id, entry_id = %view.id, "🍽️ Entrada adicionada ao cardápio");
        Ok(view)
    }

    pub async fn delete_entry(&self, company_id: Uuid, entry_id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_entry(company_id, entry_id).await? == 0 {
            return Err(AppError::not_found("Entrada de cardápio não encontrada."));
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum MenuDraft<'a> {
    Item(Uuid),
    Custom { name: &'a str, price: Decimal },
}

/// Ou `itemId`, ou `name` + `price` (>= 0).
pub fn classify_payload(payload: &CreateMenuEntryPayload) -> Result<MenuDraft<'_>, AppError> {
    if let Some(item_id) = payload.item_id {
        return Ok(MenuDraft::Item(item_id));
    }

    let name = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    match (name, payload.price) {
        (Some(_), Some(price)) if price < Decimal::ZERO => {
            Err(AppError::bad_request("O preço não pode ser negativo."))
        }
        (Some(name), Some(price)) => Ok(MenuDraft::Custom { name, price }),
        _ => Err(AppError::bad_request("Informe um itemId ou nome e preço.")),
    }
}

/// Nome/preço vêm do item referenciado; entradas avulsas usam os próprios.
pub fn resolve_entries(entries: Vec<MenuEntry>, items: &[Item]) -> Vec<MenuEntryView> {
    let by_id: HashMap<Uuid, &Item> = items.iter().map(|i| (i.id, i)).collect();

    entries
        .into_iter()
        .map(|entry| {
            let item = entry.item_id.and_then(|id| by_id.get(&id).copied());
            match item {
                Some(item) => MenuEntryView {
                    id: entry.id,
                    kind: MenuEntryKind::Item,
                    item_id: Some(item.id),
                    name: item.name.clone(),
                    price: item.base_price,
                    is_active: entry.is_active && item.is_active && item.archived_at.is_none(),
                    created_at: entry.created_at,
                },
                None => MenuEntryView {
                    id: entry.id,
                    kind: if entry.item_id.is_some() { MenuEntryKind::Item } else { MenuEntryKind::Custom },
                    item_id: entry.item_id,
                    name: entry.name.unwrap_or_default(),
                    price: entry.price,
                    is_active: entry.is_active,
                    created_at: entry.created_at,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::ItemCategory;
    use chrono::Utc;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn entry(item_id: Option<Uuid>, name: Option<&str>, price: Option<&str>) -> MenuEntry {
        MenuEntry {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            item_id,
            name: name.map(String::from),
            price: price.map(dec),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(name: &str, base_price: &str) -> Item {
        Item {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            name: name.into(),
            category: ItemCategory::Drink,
            unit: "un".into(),
            base_price: Some(dec(base_price)),
            cost_price: None,
            low_stock_threshold: None,
            is_active: true,
            archived_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_item_entries_read_name_and_price_from_item() {
        let beer = item("Cerveja", "3.00");
        let views = resolve_entries(
            vec![entry(Some(beer.id), None, None), entry(None, Some("Porção"), Some("25.00"))],
            &[beer.clone()],
        );

        assert_eq!(views[0].kind, MenuEntryKind::Item);
        assert_eq!(views[0].name, "Cerveja");
        assert_eq!(views[0].price, Some(dec("3.00")));

        assert_eq!(views[1].kind, MenuEntryKind::Custom);
        assert_eq!(views[1].name, "Porção");
        assert_eq!(views[1].price, Some(dec("25.00")));
    }

    #[test]
    fn test_archived_item_marks_entry_inactive() {
        let mut old = item("Refri", "5.00");
        old.archived_at = Some(Utc::now());
        let views = resolve_entries(vec![entry(Some(old.id), None, None)], &[old]);
        assert!(!views[0].is_active);
    }

    #[test]
    fn test_classify_payload() {
        let id = Uuid::new_v4();
        let by_item = CreateMenuEntryPayload { item_id: Some(id), name: None, price: None };
        assert_eq!(classify_payload(&by_item).unwrap(), MenuDraft::Item(id));

        let custom = CreateMenuEntryPayload { item_id: None, name: Some(" Porção ".into()), price: Some(dec("25.00")) };
        assert_eq!(
            classify_payload(&custom).unwrap(),
            MenuDraft::Custom { name: "Porção", price: dec("25.00") }
        );

        let missing_price = CreateMenuEntryPayload { item_id: None, name: Some("Porção".into()), price: None };
        assert!(classify_payload(&missing_price).is_err());

        let negative = CreateMenuEntryPayload { item_id: None, name: Some("X".into()), price: Some(dec("-1")) };
        assert!(classify_payload(&negative).is_err());
    }
}
