// src/services/sales_card_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{error::AppError, time};
use crate::db::sales_card_repo::{SalesCardFilter, ACTIVE_CARD_MESSAGE};
use crate::db::{CompanyRepository, InventoryRepository, RbacRepository, SalesCardRepository};
use crate::models::bank::{BankMovementType, NewMovement};
use crate::models::rbac::{AccessContext, MemberRoleRow, PermissionKey};
use crate::models::sales_card::{
    LineForPricing, SalesCard, SalesCardDetail, SalesCardLinePayload, SalesCardQuery, SalesCardStatus, SalesCardSummary,
    StartSalesCardPayload, StopSalesCardPayload, UpdateSalesCardPayload,
};
use crate::services::bank_service::BankService;
use crate::services::inventory_service::{clean_note, ensure_all_resolved};

pub const MAX_LINES: usize = 500;

#[derive(Clone)]
pub struct SalesCardService {
    repo: SalesCardRepository,
    inventory_repo: InventoryRepository,
    rbac_repo: RbacRepository,
    company_repo: CompanyRepository,
    bank_service: BankService,
    pool: PgPool,
}

impl SalesCardService {
    pub fn new(
        repo: SalesCardRepository,
        inventory_repo: InventoryRepository,
        rbac_repo: RbacRepository,
        company_repo: CompanyRepository,
        bank_service: BankService,
        pool: PgPool,
    ) -> Self {
        Self { repo, inventory_repo, rbac_repo, company_repo, bank_service, pool }
    }

    pub async fn list_cards(&self, company_id: Uuid, query: SalesCardQuery) -> Result<Vec<SalesCardSummary>, AppError> {
        let (from, to) = time::parse_range(query.from.as_deref(), query.to.as_deref())?;
        let filter = SalesCardFilter {
            status: query.status,
            user_id: query.user_id,
            from,
            to,
        };
        self.repo.list_cards(company_id, &filter).await
    }

    pub async fn get_card(&self, company_id: Uuid, card_id: Uuid) -> Result<SalesCardDetail, AppError> {
        let card = self.find_card(company_id, card_id).await?;
        self.detail(card).await
    }

    /// Turno em rascunho de quem chama, se houver.
    pub async fn active_card(&self, access: &AccessContext) -> Result<Option<SalesCardDetail>, AppError> {
        match self
            .repo
            .find_draft_for_user(&self.pool, access.company_id, access.user_id)
            .await?
        {
            Some(card) => Ok(Some(self.detail(card).await?)),
            None => Ok(None),
        }
    }

    pub async fn start_card(
        &self,
        access: &AccessContext,
        payload: StartSalesCardPayload,
    ) -> Result<SalesCardDetail, AppError> {
        let company_id = access.company_id;
        let start_at = match payload.start_at.as_deref() {
            Some(raw) => time::parse_instant("startAt", raw)?,
            None => Utc::now(),
        };

        // 1. Um único rascunho por pessoa (o índice parcial garante sob concorrência)
        if self
            .repo
            .find_draft_for_user(&self.pool, company_id, access.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::bad_request(ACTIVE_CARD_MESSAGE));
        }

        // 2. Cargo do turno
        let held = self
            .rbac_repo
            .list_membership_roles(&self.pool, &[access.membership_id])
            .await?;
        let role_id = choose_role(payload.role_id, &held)?;

        // 3. Local (opcional), precisa ser um local ativo da empresa
        if let Some(location_id) = payload.location_id {
            self.company_repo
                .find_location(&self.pool, company_id, location_id)
                .await?
                .ok_or_else(|| AppError::bad_request("Local inválido para esta empresa."))?;
        }

        let card = self
            .repo
            .create_card(
                &self.pool,
                company_id,
                access.user_id,
                role_id,
                payload.location_id,
                start_at,
                clean_note(payload.note.as_deref()),
            )
            .await?;

        tracing::info!(%company_id, card_id = %card.id, user_id = %access.user_id, "🕒 Turno iniciado");
        Ok(SalesCardDetail { card, lines: Vec::new() })
    }

    pub async fn update_card(
        &self,
        access: &AccessContext,
        card_id: Uuid,
        payload: UpdateSalesCardPayload,
    ) -> Result<SalesCardDetail, AppError> {
        let company_id = access.company_id;
        let lines = payload.lines.as_deref().map(normalize_lines).transpose()?;

        let mut tx = self.pool.begin().await?;

        // 1. Lê e trava o turno, depois aplica as regras sobre o estado travado
        let card = self
            .repo
            .find_card(&mut *tx, company_id, card_id)
            .await?
            .ok_or_else(|| AppError::not_found("Turno não encontrado."))?;
        let card = self.repo.lock_card(&mut *tx, card.id).await?;
        ensure_can_edit(&card, access)?;

        // 2. Observação
        if let Some(note) = payload.note.as_deref() {
            self.repo.update_note(&mut *tx, card.id, clean_note(Some(note))).await?;
        }

        // 3. Linhas: substituição completa
        if let Some((item_ids, quantities)) = lines {
            if !item_ids.is_empty() {
                let found = self
                    .inventory_repo
                    .find_items_by_ids(&mut *tx, company_id, &item_ids, true)
                    .await?;
                ensure_all_resolved(&item_ids, &found)?;
            }

            // Preços já congelados (só existem fora do rascunho)
            let previous = self.repo.list_lines(&mut *tx, card.id).await?;

            self.repo.delete_lines(&mut *tx, card.id).await?;
            if !item_ids.is_empty() {
                self.repo.insert_lines(&mut *tx, card.id, &item_ids, &quantities).await?;
            }

            // 4. Turno já enviado: recongela os preços e lança a diferença de receita
            if card.status != SalesCardStatus::Draft {
                let frozen: HashMap<Uuid, Option<Decimal>> =
                    previous.iter().map(|l| (l.item_id, l.unit_price)).collect();
                let old_revenue: Decimal = previous.iter().filter_map(|l| l.total).sum();

                let mut new_revenue = Decimal::ZERO;
                for line in self.repo.lines_for_pricing(&mut *tx, card.id).await? {
                    let (unit_price, total) = reprice_line(&frozen, &line);
                    new_revenue += total.unwrap_or(Decimal::ZERO);
                    self.repo.set_line_price(&mut *tx, line.id, unit_price, total).await?;
                }

                let delta = new_revenue - old_revenue;
                self.bank_service
                    .post_movement(
                        &mut tx,
                        company_id,
                        NewMovement {
                            movement_type: BankMovementType::SalesCard,
                            amount: delta,
                            restock_id: None,
                            sales_card_id: Some(card.id),
                            note: Some("Correção de turno enviado"),
                            at: card.end_at.unwrap_or_else(Utc::now),
                        },
                    )
                    .await?;

                tracing::info!(%company_id, card_id = %card.id, delta = %delta, "✏️ Linhas de turno enviado corrigidas");
            }
        }

        self.repo.touch(&mut *tx, card.id).await?;
        tx.commit().await?;

        self.get_card(company_id, card.id).await
    }

    /// Encerra o turno: congela preços, muda para SUBMITTED e lança a receita.
    pub async fn stop_card(
        &self,
        access: &AccessContext,
        card_id: Uuid,
        payload: StopSalesCardPayload,
    ) -> Result<SalesCardDetail, AppError> {
        let company_id = access.company_id;
        let requested_end = time::parse_optional_instant("endAt", payload.end_at.as_deref())?;

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        let card = self
            .repo
            .find_card(&mut *tx, company_id, card_id)
            .await?
            .ok_or_else(|| AppError::not_found("Turno não encontrado."))?;
        let card = self.repo.lock_card(&mut *tx, card.id).await?;
        ensure_can_stop(&card, access)?;

        let end_at = resolve_end_at(card.start_at, requested_end, Utc::now())?;

        // 2. Congela os preços de cada linha
        let mut revenue = Decimal::ZERO;
        for line in self.repo.lines_for_pricing(&mut *tx, card.id).await? {
            let (unit_price, total) = price_line(line.base_price, line.quantity_sold);
            revenue += total.unwrap_or(Decimal::ZERO);
            self.repo.set_line_price(&mut *tx, line.id, unit_price, total).await?;
        }

        // 3. DRAFT -> SUBMITTED (condicional)
        let card = self
            .repo
            .transition(&mut *tx, card.id, SalesCardStatus::Draft, SalesCardStatus::Submitted, Some(end_at))
            .await?
            .ok_or_else(|| AppError::bad_request("Apenas turnos em rascunho podem ser encerrados."))?;

        // 4. Receita no livro-razão
        self.bank_service
            .post_movement(
                &mut tx,
                company_id,
                NewMovement {
                    movement_type: BankMovementType::SalesCard,
                    amount: revenue,
                    restock_id: None,
                    sales_card_id: Some(card.id),
                    note: None,
                    at: end_at,
                },
            )
            .await?;

        // 5. Commit
        tx.commit().await?;

        tracing::info!(%company_id, card_id = %card.id, revenue = %revenue, "✅ Turno encerrado");
        self.detail(card).await
    }

    pub async fn lock_card(&self, company_id: Uuid, card_id: Uuid) -> Result<SalesCardDetail, AppError> {
        let card = self.find_card(company_id, card_id).await?;
        ensure_can_lock(&card)?;

        let card = self
            .repo
            .transition(&self.pool, card.id, SalesCardStatus::Submitted, SalesCardStatus::Locked, None)
            .await?
            .ok_or_else(|| AppError::bad_request("Apenas turnos enviados podem ser travados."))?;

        tracing::info!(%company_id, card_id = %card.id, "🔒 Turno travado");
        self.detail(card).await
    }

    async fn find_card(&self, company_id: Uuid, card_id: Uuid) -> Result<SalesCard, AppError> {
        self.repo
            .find_card(&self.pool, company_id, card_id)
            .await?
            .ok_or_else(|| AppError::not_found("Turno não encontrado."))
    }

    async fn detail(&self, card: SalesCard) -> Result<SalesCardDetail, AppError> {
        let lines = self.repo.list_lines(&self.pool, card.id).await?;
        Ok(SalesCardDetail { card, lines })
    }
}

// ---
// Regras de transição (puras)
// ---

/// Cargo explícito (precisa ser do membro) -> primeiro com `salesCards.create` -> primeiro em ordem alfabética.
pub fn choose_role(explicit: Option<Uuid>, held: &[MemberRoleRow]) -> Result<Uuid, AppError> {
    if let Some(role_id) = explicit {
        return held
            .iter()
            .find(|r| r.role_id == role_id)
            .map(|r| r.role_id)
            .ok_or_else(|| AppError::bad_request("Você não possui este cargo nesta empresa."));
    }

    let mut sorted: Vec<&MemberRoleRow> = held.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let create_key = PermissionKey::SalesCardsCreate.as_str();
    sorted
        .iter()
        .find(|r| r.permissions.iter().any(|p| p == create_key))
        .or_else(|| sorted.first())
        .map(|r| r.role_id)
        .ok_or_else(|| AppError::bad_request("Você não possui nenhum cargo nesta empresa."))
}

/// Travado nunca; o responsável só mexe no próprio rascunho (mesmo com edit.anyUnlocked).
pub fn ensure_can_edit(card: &SalesCard, access: &AccessContext) -> Result<(), AppError> {
    if card.status == SalesCardStatus::Locked {
        return Err(AppError::bad_request("Turnos travados não podem ser editados."));
    }
    if card.user_id == access.user_id {
        if card.status != SalesCardStatus::Draft {
            return Err(AppError::bad_request(
                "O responsável só pode editar turnos em rascunho.",
            ));
        }
        return Ok(());
    }
    if !access.has(PermissionKey::SalesCardsEditAnyUnlocked) {
        return Err(AppError::forbidden("Você só pode editar os seus próprios turnos."));
    }
    Ok(())
}

pub fn ensure_can_stop(card: &SalesCard, access: &AccessContext) -> Result<(), AppError> {
    if card.user_id != access.user_id && !access.has(PermissionKey::SalesCardsStopAnyDraft) {
        return Err(AppError::forbidden("Você só pode encerrar os seus próprios turnos."));
    }
    if card.status != SalesCardStatus::Draft {
        return Err(AppError::bad_request("Apenas turnos em rascunho podem ser encerrados."));
    }
    Ok(())
}

pub fn ensure_can_lock(card: &SalesCard) -> Result<(), AppError> {
    if card.status != SalesCardStatus::Submitted {
        return Err(AppError::bad_request("Apenas turnos enviados podem ser travados."));
    }
    Ok(())
}

pub fn resolve_end_at(
    start_at: DateTime<Utc>,
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, AppError> {
    let end_at = requested.unwrap_or(now);
    if end_at < start_at {
        return Err(AppError::bad_request("endAt não pode ser anterior a startAt."));
    }
    Ok(end_at)
}

/// (preço unitário, total) congelados a partir do preço base atual.
pub fn price_line(base_price: Option<Decimal>, quantity_sold: i32) -> (Option<Decimal>, Option<Decimal>) {
    match base_price {
        Some(price) => (Some(price), Some(price * Decimal::from(quantity_sold))),
        None => (None, None),
    }
}

/// Item que já estava no turno mantém o preço congelado; item novo usa o preço base atual.
pub fn reprice_line(
    frozen: &HashMap<Uuid, Option<Decimal>>,
    line: &LineForPricing,
) -> (Option<Decimal>, Option<Decimal>) {
    let price = frozen.get(&line.item_id).copied().unwrap_or(line.base_price);
    price_line(price, line.quantity_sold)
}

/// Ids únicos, quantidades >= 0, linhas zeradas descartadas.
pub fn normalize_lines(lines: &[SalesCardLinePayload]) -> Result<(Vec<Uuid>, Vec<i32>), AppError> {
    if lines.len() > MAX_LINES {
        return Err(AppError::bad_request(format!("Máximo de {MAX_LINES} linhas por turno.")));
    }

    let mut seen = std::collections::HashSet::new();
    let mut item_ids = Vec::new();
    let mut quantities = Vec::new();

    for line in lines {
        if !seen.insert(line.item_id) {
            return Err(AppError::bad_request(format!("Item repetido nas linhas: {}", line.item_id)));
        }
        if line.quantity_sold < 0 {
            return Err(AppError::bad_request("A quantidade vendida não pode ser negativa."));
        }
        if line.quantity_sold > 0 {
            item_ids.push(line.item_id);
            quantities.push(line.quantity_sold);
        }
    }

    Ok((item_ids, quantities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeSet;

    fn card(user_id: Uuid, status: SalesCardStatus) -> SalesCard {
        let now = Utc::now();
        SalesCard {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            user_id,
            role_id: Uuid::new_v4(),
            location_id: None,
            status,
            start_at: now,
            end_at: None,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn access(user_id: Uuid, keys: &[PermissionKey]) -> AccessContext {
        AccessContext {
            user_id,
            company_id: Uuid::new_v4(),
            membership_id: Uuid::new_v4(),
            is_owner: false,
            permissions: keys.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn held(name: &str, perms: &[&str]) -> MemberRoleRow {
        MemberRoleRow {
            membership_id: Uuid::nil(),
            role_id: Uuid::new_v4(),
            name: name.to_string(),
            key: name.to_lowercase(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
            is_system: false,
        }
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_locked_cards_are_never_editable() {
        let owner = Uuid::new_v4();
        let c = card(owner, SalesCardStatus::Locked);
        let mut ctx = access(owner, &[PermissionKey::SalesCardsEditAnyUnlocked]);
        assert_eq!(ensure_can_edit(&c, &ctx).unwrap_err().kind(), "BAD_REQUEST");
        ctx.is_owner = true;
        assert!(ensure_can_edit(&c, &ctx).is_err());
    }

    #[test]
    fn test_card_owner_edits_only_drafts() {
        let user = Uuid::new_v4();
        let ctx = access(user, &[PermissionKey::SalesCardsEditOwnDraft]);
        assert!(ensure_can_edit(&card(user, SalesCardStatus::Draft), &ctx).is_ok());
        let err = ensure_can_edit(&card(user, SalesCardStatus::Submitted), &ctx).unwrap_err();
        assert_eq!(err.kind(), "BAD_REQUEST");
    }

    #[test]
    fn test_others_cards_need_edit_any() {
        let ctx = access(Uuid::new_v4(), &[PermissionKey::SalesCardsEditOwnDraft]);
        let err = ensure_can_edit(&card(Uuid::new_v4(), SalesCardStatus::Draft), &ctx).unwrap_err();
        assert_eq!(err.kind(), "FORBIDDEN");

        let manager = access(Uuid::new_v4(), &[PermissionKey::SalesCardsEditAnyUnlocked]);
        assert!(ensure_can_edit(&card(Uuid::new_v4(), SalesCardStatus::Submitted), &manager).is_ok());
    }

    #[test]
    fn test_card_owner_with_edit_any_still_edits_only_drafts() {
        let user = Uuid::new_v4();
        let ctx = access(user, &[PermissionKey::SalesCardsEditAnyUnlocked]);
        let err = ensure_can_edit(&card(user, SalesCardStatus::Submitted), &ctx).unwrap_err();
        assert_eq!(err.kind(), "BAD_REQUEST");
        assert!(ensure_can_edit(&card(user, SalesCardStatus::Draft), &ctx).is_ok());

        // Dono da empresa também não reabre o próprio turno enviado
        let mut owner = access(user, &[]);
        owner.is_owner = true;
        assert!(ensure_can_edit(&card(user, SalesCardStatus::Submitted), &owner).is_err());
        assert!(ensure_can_edit(&card(Uuid::new_v4(), SalesCardStatus::Submitted), &owner).is_ok());
    }

    #[test]
    fn test_reprice_keeps_frozen_price_and_prices_new_items() {
        let beer = Uuid::new_v4();
        let wine = Uuid::new_v4();
        let frozen = HashMap::from([(beer, Some(dec("3.00")))]);

        // Preço base mudou depois do encerramento: vale o congelado
        let beer_line = LineForPricing {
            id: Uuid::new_v4(),
            item_id: beer,
            quantity_sold: 5,
            base_price: Some(dec("3.50")),
        };
        assert_eq!(reprice_line(&frozen, &beer_line), (Some(dec("3.00")), Some(dec("15.00"))));

        let wine_line = LineForPricing {
            id: Uuid::new_v4(),
            item_id: wine,
            quantity_sold: 2,
            base_price: Some(dec("6.00")),
        };
        assert_eq!(reprice_line(&frozen, &wine_line), (Some(dec("6.00")), Some(dec("12.00"))));

        // Item congelado sem preço continua sem preço
        let unpriced = HashMap::from([(wine, None)]);
        assert_eq!(reprice_line(&unpriced, &wine_line), (None, None));
    }

    #[test]
    fn test_stop_rules() {
        let user = Uuid::new_v4();
        let own = access(user, &[PermissionKey::SalesCardsStopOwnDraft]);
        assert!(ensure_can_stop(&card(user, SalesCardStatus::Draft), &own).is_ok());
        assert_eq!(
            ensure_can_stop(&card(Uuid::new_v4(), SalesCardStatus::Draft), &own).unwrap_err().kind(),
            "FORBIDDEN"
        );
        assert_eq!(
            ensure_can_stop(&card(user, SalesCardStatus::Submitted), &own).unwrap_err().kind(),
            "BAD_REQUEST"
        );

        let any = access(Uuid::new_v4(), &[PermissionKey::SalesCardsStopAnyDraft]);
        assert!(ensure_can_stop(&card(user, SalesCardStatus::Draft), &any).is_ok());
    }

    #[test]
    fn test_lock_requires_submitted() {
        let user = Uuid::new_v4();
        assert!(ensure_can_lock(&card(user, SalesCardStatus::Submitted)).is_ok());
        assert!(ensure_can_lock(&card(user, SalesCardStatus::Draft)).is_err());
        assert!(ensure_can_lock(&card(user, SalesCardStatus::Locked)).is_err());
    }

    #[test]
    fn test_end_at_cannot_precede_start() {
        let start = Utc::now();
        assert!(resolve_end_at(start, Some(start - Duration::minutes(1)), start).is_err());
        assert_eq!(resolve_end_at(start, None, start).unwrap(), start);
        let later = start + Duration::hours(2);
        assert_eq!(resolve_end_at(start, Some(later), start).unwrap(), later);
    }

    #[test]
    fn test_price_line_freezes_base_price() {
        assert_eq!(price_line(Some(dec("3.00")), 4), (Some(dec("3.00")), Some(dec("12.00"))));
        assert_eq!(price_line(None, 5), (None, None));
        assert_eq!(price_line(Some(dec("6.00")), 0).1, Some(Decimal::ZERO));
    }

    #[test]
    fn test_normalize_lines_drops_zeros_and_rejects_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = vec![
            SalesCardLinePayload { item_id: a, quantity_sold: 2 },
            SalesCardLinePayload { item_id: b, quantity_sold: 0 },
        ];
        let (ids, qty) = normalize_lines(&lines).unwrap();
        assert_eq!(ids, vec![a]);
        assert_eq!(qty, vec![2]);

        let dup = vec![
            SalesCardLinePayload { item_id: a, quantity_sold: 1 },
            SalesCardLinePayload { item_id: a, quantity_sold: 0 },
        ];
        assert!(normalize_lines(&dup).is_err());

        assert!(normalize_lines(&[]).unwrap().0.is_empty());
    }

    #[test]
    fn test_choose_role_prefers_explicit_then_create_permission() {
        let caixa = held("Caixa", &["salesCards.read"]);
        let bar = held("Bartender", &[]);
        let vendas = held("Vendas", &["salesCards.create"]);
        let roles = vec![caixa.clone(), bar.clone(), vendas.clone()];

        assert_eq!(choose_role(Some(caixa.role_id), &roles).unwrap(), caixa.role_id);
        assert_eq!(choose_role(None, &roles).unwrap(), vendas.role_id);
        assert_eq!(choose_role(None, &[caixa.clone(), bar.clone()]).unwrap(), bar.role_id);
    }

    #[test]
    fn test_choose_role_rejects_unheld_or_empty() {
        let roles = vec![held("Caixa", &[])];
        assert!(choose_role(Some(Uuid::new_v4()), &roles).is_err());
        assert!(choose_role(None, &[]).is_err());
    }
}
