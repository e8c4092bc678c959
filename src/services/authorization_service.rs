// src/services/authorization_service.rs

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::RbacRepository;
use crate::models::rbac::{AccessContext, AccessSnapshot, PermissionKey, Requirement};

const NO_ACCESS: &str = "Você não tem acesso a esta empresa.";

/// Motor de autorização: carrega um snapshot imutável por verificação e o avalia.
#[derive(Clone)]
pub struct AuthorizationService {
    repo: RbacRepository,
}

impl AuthorizationService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    async fn load_snapshot(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<AccessSnapshot>, AppError> {
        let rows = self.repo.load_access_rows(user_id, company_id).await?;
        Ok(AccessSnapshot::from_rows(rows))
    }

    /// Apenas associação: qualquer membro ativo (ou o dono) passa.
    pub async fn check_access(&self, user_id: Uuid, company_id: Uuid) -> Result<AccessContext, AppError> {
        let snapshot = self.load_snapshot(user_id, company_id).await?;
        evaluate(user_id, company_id, snapshot.as_ref(), None).inspect_err(|e| {
            tracing::warn!(%user_id, %company_id, "Acesso negado: {}", e);
        })
    }

    pub async fn check_permission(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        requirement: Requirement,
    ) -> Result<AccessContext, AppError> {
        let snapshot = self.load_snapshot(user_id, company_id).await?;
        evaluate(user_id, company_id, snapshot.as_ref(), Some(requirement)).inspect_err(|e| {
            tracing::warn!(%user_id, %company_id, "Permissão negada: {}", e);
        })
    }
}

fn join_keys(keys: &[PermissionKey]) -> String {
    keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}

/// Avaliação pura do snapshot.
pub fn evaluate(
    user_id: Uuid,
    company_id: Uuid,
    snapshot: Option<&AccessSnapshot>,
    requirement: Option<Requirement>,
) -> Result<AccessContext, AppError> {
    // 1. Sem associação ativa, ou empresa arquivada
    let snapshot = match snapshot {
        Some(s) if !s.company_archived => s,
        _ => return Err(AppError::forbidden(NO_ACCESS)),
    };

    // 2. O dono tem acesso total, sem depender de cargos
    let is_owner = snapshot.owner_id == user_id;
    let permissions = snapshot.effective_permissions();

    let context = AccessContext {
        user_id,
        company_id,
        membership_id: snapshot.membership_id,
        is_owner,
        permissions,
    };

    if is_owner {
        return Ok(context);
    }

    // 3. União das permissões dos cargos ativos
    match requirement {
        None => Ok(context),
        Some(Requirement::All(required)) => {
            let missing: Vec<PermissionKey> = required
                .iter()
                .copied()
                .filter(|k| !context.permissions.contains(k))
                .collect();

            if missing.is_empty() {
                Ok(context)
            } else {
                Err(AppError::forbidden(format!(
                    "Permissões ausentes: {}",
                    join_keys(&missing)
                )))
            }
        }
        Some(Requirement::Any(accepted)) => {
            if accepted.iter().any(|k| context.permissions.contains(k)) {
                Ok(context)
            } else {
                Err(AppError::forbidden(format!(
                    "É necessária ao menos uma das permissões: {}",
                    join_keys(accepted)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::RoleGrant;

    fn grant(perms: &[&str], archived: bool) -> RoleGrant {
        RoleGrant {
            role_id: Uuid::new_v4(),
            name: "cargo".into(),
            permissions: perms.iter().map(|p| p.to_string()).collect(),
            archived,
        }
    }

    fn snapshot(owner_id: Uuid, roles: Vec<RoleGrant>) -> AccessSnapshot {
        AccessSnapshot {
            membership_id: Uuid::new_v4(),
            active_role_id: None,
            owner_id,
            company_archived: false,
            roles,
        }
    }

    const STOCK: Requirement = Requirement::All(&[PermissionKey::InventoryRead, PermissionKey::InventoryWrite]);
    const STOP: Requirement =
        Requirement::Any(&[PermissionKey::SalesCardsStopOwnDraft, PermissionKey::SalesCardsStopAnyDraft]);

    #[test]
    fn test_no_membership_is_forbidden() {
        let err = evaluate(Uuid::new_v4(), Uuid::new_v4(), None, None).unwrap_err();
        assert_eq!(err.kind(), "FORBIDDEN");
    }

    #[test]
    fn test_archived_company_is_forbidden_even_for_owner() {
        let owner = Uuid::new_v4();
        let mut snap = snapshot(owner, vec![]);
        snap.company_archived = true;
        assert!(evaluate(owner, Uuid::new_v4(), Some(&snap), Some(STOCK)).is_err());
    }

    #[test]
    fn test_owner_bypasses_every_requirement() {
        let owner = Uuid::new_v4();
        let snap = snapshot(owner, vec![]);
        let ctx = evaluate(owner, Uuid::new_v4(), Some(&snap), Some(STOCK)).unwrap();
        assert!(ctx.is_owner);
        assert!(ctx.has(PermissionKey::CompanyArchive));
        assert_eq!(ctx.effective_permissions().len(), PermissionKey::ALL.len());
    }

    #[test]
    fn test_all_lists_every_missing_key() {
        let user = Uuid::new_v4();
        let snap = snapshot(Uuid::new_v4(), vec![grant(&["salesCards.read"], false)]);
        let err = evaluate(user, Uuid::new_v4(), Some(&snap), Some(STOCK)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("inventory.read"));
        assert!(message.contains("inventory.write"));
    }

    #[test]
    fn test_permissions_union_across_roles() {
        let user = Uuid::new_v4();
        let snap = snapshot(
            Uuid::new_v4(),
            vec![grant(&["inventory.read"], false), grant(&["inventory.write"], false)],
        );
        assert!(evaluate(user, Uuid::new_v4(), Some(&snap), Some(STOCK)).is_ok());
    }

    #[test]
    fn test_archived_roles_grant_nothing() {
        let user = Uuid::new_v4();
        let snap = snapshot(
            Uuid::new_v4(),
            vec![grant(&["inventory.read"], false), grant(&["inventory.write"], true)],
        );
        assert!(evaluate(user, Uuid::new_v4(), Some(&snap), Some(STOCK)).is_err());
    }

    #[test]
    fn test_any_requires_a_single_key() {
        let user = Uuid::new_v4();
        let holder = snapshot(Uuid::new_v4(), vec![grant(&["salesCards.stop.ownDraft"], false)]);
        assert!(evaluate(user, Uuid::new_v4(), Some(&holder), Some(STOP)).is_ok());

        let none = snapshot(Uuid::new_v4(), vec![grant(&["salesCards.read"], false)]);
        let err = evaluate(user, Uuid::new_v4(), Some(&none), Some(STOP)).unwrap_err();
        assert_eq!(err.kind(), "FORBIDDEN");
    }

    #[test]
    fn test_membership_only_check_passes_without_roles() {
        let user = Uuid::new_v4();
        let snap = snapshot(Uuid::new_v4(), vec![]);
        let ctx = evaluate(user, Uuid::new_v4(), Some(&snap), None).unwrap();
        assert!(!ctx.is_owner);
        assert!(!ctx.has(PermissionKey::CompanyRead));
    }
}
