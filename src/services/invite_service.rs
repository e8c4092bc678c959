// src/services/invite_service.rs

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{InviteRepository, RbacRepository};
use crate::models::auth::User;
use crate::models::invite::{AcceptedInvite, CreateInvitePayload, Invite, InviteStatus};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;
const CODE_ATTEMPTS: usize = 5;
const DEFAULT_EXPIRY_HOURS: i64 = 72;

#[derive(Clone)]
pub struct InviteService {
    invite_repo: InviteRepository,
    rbac_repo: RbacRepository,
    pool: PgPool,
}

impl InviteService {
    pub fn new(invite_repo: InviteRepository, rbac_repo: RbacRepository, pool: PgPool) -> Self {
        Self { invite_repo, rbac_repo, pool }
    }

    pub async fn create_invite(
        &self,
        company_id: Uuid,
        created_by_id: Uuid,
        payload: CreateInvitePayload,
    ) -> Result<Invite, AppError> {
        let email = payload.email.trim().to_lowercase();

        // 1. O cargo precisa existir, estar ativo e não ser de sistema
        let role = self
            .rbac_repo
            .find_role(&self.pool, company_id, payload.role_id)
            .await?
            .filter(|r| !r.is_system)
            .ok_or_else(|| AppError::bad_request("Cargo inválido para convite."))?;

        let hours = payload.expires_in_hours.unwrap_or(DEFAULT_EXPIRY_HOURS);
        if hours < 1 {
            return Err(AppError::bad_request("A validade deve ser de pelo menos 1 hora."));
        }
        let expires_at = Utc::now() + Duration::hours(hours);

        // 2. Gera o código; colisões são raras, então tentamos algumas vezes
        let mut last_error = None;
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_code(&mut rand::thread_rng());
            match self
                .invite_repo
                .create_invite(&self.pool, company_id, role.id, &email, &code, expires_at, created_by_id)
                .await
            {
                Ok(invite) => {
                    tracing::info!(
                        %company_id,
                        email = %mask_email(&email),
                        "✉️ Convite criado"
                    );
                    return Ok(invite);
                }
                Err(e @ AppError::Conflict { .. }) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::conflict("Não foi possível gerar um código de convite único.", &["code"])
        }))
    }

    pub async fn list_invites(&self, company_id: Uuid) -> Result<Vec<Invite>, AppError> {
        self.invite_repo.list_invites(company_id).await
    }

    pub async fn accept_invite(&self, user: &User, raw_code: &str) -> Result<AcceptedInvite, AppError> {
        let code = normalize_code(raw_code);

        // 1. Validações fora da transação
        let lookup = self
            .invite_repo
            .find_by_code(&self.pool, &code)
            .await?
            .filter(|l| l.company_archived_at.is_none())
            .ok_or_else(|| AppError::not_found("Convite não encontrado."))?;
        let invite = lookup.invite;

        if invite.status != InviteStatus::Pending {
            return Err(AppError::bad_request("Este convite não está mais pendente."));
        }

        if is_expired(invite.expires_at, Utc::now()) {
            self.invite_repo.mark_expired(&self.pool, invite.id).await?;
            return Err(AppError::bad_request("Este convite expirou."));
        }

        if !invite.email.eq_ignore_ascii_case(user.email.trim()) {
            return Err(AppError::forbidden("Este convite foi enviado para outro e-mail."));
        }

        // 2. Transação: CAS no convite + associação + cargo
        let mut tx = self.pool.begin().await?;

        let swapped = self.invite_repo.mark_accepted(&mut *tx, invite.id, user.id).await?;
        if swapped == 0 {
            return Err(AppError::bad_request("Este convite não está mais pendente."));
        }

        if self
            .rbac_repo
            .find_membership_by_user(&mut *tx, invite.company_id, user.id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Você já é membro desta empresa.", &["userId"]));
        }

        let membership = self
            .rbac_repo
            .create_membership(&mut *tx, invite.company_id, user.id, Some(invite.role_id))
            .await?;
        self.rbac_repo
            .add_membership_role(&mut *tx, membership.id, invite.role_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            company_id = %invite.company_id,
            user_id = %user.id,
            "🤝 Convite aceito"
        );

        Ok(AcceptedInvite {
            company_id: invite.company_id,
            membership_id: membership.id,
            role_id: invite.role_id,
        })
    }
}

pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at <= now
}

/// `joao@bar.com` -> `jo***@bar.com`; partes locais curtas mostram só 1 caractere.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible = if local.chars().count() <= 2 { 1 } else { 2 };
            let head: String = local.chars().take(visible).collect();
            format!("{head}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_codes_use_the_unambiguous_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
            assert!(!code.contains('O') && !code.contains('0') && !code.contains('I') && !code.contains('1'));
        }
    }

    #[test]
    fn test_code_normalization() {
        assert_eq!(normalize_code("  k7qx2m "), "K7QX2M");
    }

    #[test]
    fn test_expiry_is_inclusive_of_the_deadline() {
        let now = Utc::now();
        assert!(is_expired(now, now));
        assert!(is_expired(now - Duration::minutes(1), now));
        assert!(!is_expired(now + Duration::hours(DEFAULT_EXPIRY_HOURS), now));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("joao@bar.com"), "jo***@bar.com");
        assert_eq!(mask_email("jo@bar.com"), "j***@bar.com");
        assert_eq!(mask_email("sem-arroba"), "***");
    }
}
