// src/services/company_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{CompanyRepository, RbacRepository};
use crate::models::bank::{BankMovementType, NewMovement};
use crate::models::company::{
    Company, CompanyLocation, CompanyType, CreateCompanyPayload, CreatedCompany, LocationPayload,
    UpdateCompanyPayload,
};
use crate::services::bank_service::BankService;

const MAX_SLUG_LEN: usize = 64;
const MAX_SLUG_SUFFIX: u32 = 20;

pub const OWNER_ROLE_NAME: &str = "Owner";
pub const OWNER_ROLE_KEY: &str = "owner";

#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    rbac_repo: RbacRepository,
    bank_service: BankService,
    pool: PgPool,
}

impl CompanyService {
    pub fn new(
        company_repo: CompanyRepository,
        rbac_repo: RbacRepository,
        bank_service: BankService,
        pool: PgPool,
    ) -> Self {
        Self { company_repo, rbac_repo, bank_service, pool }
    }

    /// Cria empresa + cargo Owner + associação do criador, tudo ou nada.
    pub async fn create_company(
        &self,
        owner_id: Uuid,
        payload: CreateCompanyPayload,
    ) -> Result<CreatedCompany, AppError> {
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("O nome da empresa é obrigatório."));
        }

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Resolve o slug
        let slug = match payload.slug.as_deref() {
            Some(explicit) => {
                let slug = slugify(explicit, MAX_SLUG_LEN);
                if slug.is_empty() {
                    return Err(AppError::bad_request("Slug inválido."));
                }
                if self.company_repo.slug_exists(&mut *tx, &slug).await? {
                    return Err(AppError::conflict("Já existe uma empresa com este slug.", &["slug"]));
                }
                slug
            }
            None => {
                let mut base = slugify(name, MAX_SLUG_LEN);
                if base.is_empty() {
                    base = "empresa".to_string();
                }
                let mut chosen = None;
                for candidate in slug_candidates(&base) {
                    if !self.company_repo.slug_exists(&mut *tx, &candidate).await? {
                        chosen = Some(candidate);
                        break;
                    }
                }
                chosen.ok_or_else(|| {
                    AppError::conflict("Não foi possível gerar um slug livre para este nome.", &["slug"])
                })?
            }
        };

        // 3. Empresa
        let mut company = self
            .company_repo
            .create_company(
                &mut *tx,
                name,
                &slug,
                payload.company_type.unwrap_or(CompanyType::Other),
                owner_id,
            )
            .await?;

        // 4. Cargo de sistema "Owner" (sem permissões: o dono passa por fora)
        let owner_role = self
            .rbac_repo
            .create_role(&mut *tx, company.id, OWNER_ROLE_NAME, OWNER_ROLE_KEY, &[], true)
            .await?;

        // 5. Associação do criador, já com o cargo ativo
        let membership = self
            .rbac_repo
            .create_membership(&mut *tx, company.id, owner_id, Some(owner_role.id))
            .await?;
        self.rbac_repo
            .add_membership_role(&mut *tx, membership.id, owner_role.id)
            .await?;

        // 6. Saldo inicial entra como lançamento
        let opening = payload.bank_balance.unwrap_or(Decimal::ZERO);
        if opening != Decimal::ZERO {
            self.bank_service
                .post_movement(
                    &mut tx,
                    company.id,
                    NewMovement {
                        movement_type: BankMovementType::OpeningBalance,
                        amount: opening,
                        restock_id: None,
                        sales_card_id: None,
                        note: Some("Saldo inicial"),
                        at: Utc::now(),
                    },
                )
                .await?;
            company.bank_balance = opening;
        }

        // 7. Commit
        tx.commit().await?;

        tracing::info!(company_id = %company.id, slug = %company.slug, "🏢 Empresa criada");

        Ok(CreatedCompany { company, owner_role, membership })
    }

    pub async fn list_my_companies(&self, user_id: Uuid) -> Result<Vec<Company>, AppError> {
        self.company_repo.list_companies_for_user(user_id).await
    }

    pub async fn get_company(&self, company_id: Uuid) -> Result<Company, AppError> {
        self.company_repo
            .find_company(&self.pool, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa não encontrada."))
    }

    /// Nome/tipo e, opcionalmente, ajuste de saldo (lançamento com a diferença).
    pub async fn update_company(
        &self,
        company_id: Uuid,
        payload: UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        let name = payload.name.as_deref().map(str::trim);
        if name == Some("") {
            return Err(AppError::bad_request("O nome da empresa não pode ser vazio."));
        }

        let mut tx = self.pool.begin().await?;

        if name.is_some() || payload.company_type.is_some() {
            self.company_repo
                .update_company(&mut *tx, company_id, name, payload.company_type)
                .await?;
        }

        if let Some(target) = payload.bank_balance {
            let current = self.company_repo.lock_bank_balance(&mut *tx, company_id).await?;
            self.bank_service
                .post_movement(
                    &mut tx,
                    company_id,
                    NewMovement {
                        movement_type: BankMovementType::Adjustment,
                        amount: target - current,
                        restock_id: None,
                        sales_card_id: None,
                        note: Some("Ajuste manual de saldo"),
                        at: Utc::now(),
                    },
                )
                .await?;
        }

        let company = self
            .company_repo
            .find_company(&mut *tx, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa não encontrada."))?;

        tx.commit().await?;
        Ok(company)
    }

    pub async fn archive_company(&self, company_id: Uuid) -> Result<Company, AppError> {
        let company = self.company_repo.archive_company(&self.pool, company_id).await?;
        tracing::info!(%company_id, "🗄️ Empresa arquivada");
        Ok(company)
    }

    // ---
    // Locais
    // ---

    pub async fn list_locations(&self, company_id: Uuid) -> Result<Vec<CompanyLocation>, AppError> {
        self.company_repo.list_locations(company_id).await
    }

    pub async fn create_location(
        &self,
        company_id: Uuid,
        payload: LocationPayload,
    ) -> Result<CompanyLocation, AppError> {
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("O nome do local é obrigatório."));
        }
        self.company_repo.create_location(&self.pool, company_id, name).await
    }

    pub async fn update_location(
        &self,
        company_id: Uuid,
        location_id: Uuid,
        payload: LocationPayload,
    ) -> Result<CompanyLocation, AppError> {
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("O nome do local é obrigatório."));
        }
        self.find_location(company_id, location_id).await?;
        self.company_repo.rename_location(&self.pool, location_id, name).await
    }

    pub async fn archive_location(&self, company_id: Uuid, location_id: Uuid) -> Result<CompanyLocation, AppError> {
        self.find_location(company_id, location_id).await?;
        self.company_repo.archive_location(&self.pool, location_id).await
    }

    async fn find_location(&self, company_id: Uuid, location_id: Uuid) -> Result<CompanyLocation, AppError> {
        self.company_repo
            .find_location(&self.pool, company_id, location_id)
            .await?
            .ok_or_else(|| AppError::not_found("Local não encontrado."))
    }
}

/// Minúsculas, sem aspas, qualquer sequência não alfanumérica vira `-`,
/// sem hífens nas pontas, cortado em `max_len`.
pub fn slugify(input: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().to_lowercase().chars() {
        if ch == '\'' || ch == '"' {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(max_len);
    slug.trim_end_matches('-').to_string()
}

/// `base`, `base-2`, ..., `base-20`, sempre dentro do limite de tamanho.
pub fn slug_candidates(base: &str) -> Vec<String> {
    let mut candidates = vec![base.to_string()];
    for n in 2..=MAX_SLUG_SUFFIX {
        let suffix = format!("-{n}");
        let mut head = base.to_string();
        head.truncate(MAX_SLUG_LEN - suffix.len());
        candidates.push(format!("{}{}", head.trim_end_matches('-'), suffix));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Bar do Zé", 64), "bar-do-z");
        assert_eq!(slugify("  Joe's   Pub!! ", 64), "joes-pub");
        assert_eq!(slugify("---", 64), "");
    }

    #[test]
    fn test_slugify_respects_max_len_without_trailing_dash() {
        let slug = slugify("abcde fghij", 6);
        assert_eq!(slug, "abcde");
        assert!(slugify(&"x".repeat(100), 64).len() <= 64);
    }

    #[test]
    fn test_slug_candidates_are_suffixed_up_to_twenty() {
        let candidates = slug_candidates("bar");
        assert_eq!(candidates.len(), 20);
        assert_eq!(candidates[0], "bar");
        assert_eq!(candidates[1], "bar-2");
        assert_eq!(candidates[19], "bar-20");
    }

    #[test]
    fn test_slug_candidates_fit_the_limit() {
        let base = "a".repeat(64);
        for candidate in slug_candidates(&base) {
            assert!(candidate.len() <= 64, "{candidate}");
        }
    }
}
