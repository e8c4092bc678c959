// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::RbacRepository;
use crate::models::rbac::{CompanyRole, CreateRolePayload, PermissionKey, UpdateRolePayload};
use crate::services::company_service::slugify;

const MAX_ROLE_KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_roles(&self, company_id: Uuid) -> Result<Vec<CompanyRole>, AppError> {
        self.repo.list_roles(company_id).await
    }

    pub async fn create_role(&self, company_id: Uuid, payload: CreateRolePayload) -> Result<CompanyRole, AppError> {
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("O nome do cargo é obrigatório."));
        }

        let key = slugify(payload.key.as_deref().unwrap_or(name), MAX_ROLE_KEY_LEN);
        if key.is_empty() {
            return Err(AppError::bad_request("Não foi possível derivar uma chave para o cargo."));
        }

        let permissions = validate_permissions(&payload.permissions)?;

        let role = self
            .repo
            .create_role(&self.pool, company_id, name, &key, &permissions, false)
            .await?;

        tracing::info!(%company_id, role_id = %role.id, key = %role.key, "🛡️ Cargo criado");
        Ok(role)
    }

    pub async fn update_role(
        &self,
        company_id: Uuid,
        role_id: Uuid,
        payload: UpdateRolePayload,
    ) -> Result<CompanyRole, AppError> {
        let role = self.find_editable_role(company_id, role_id).await?;

        let name = payload.name.as_deref().map(str::trim);
        if name == Some("") {
            return Err(AppError::bad_request("O nome do cargo não pode ser vazio."));
        }

        let permissions = payload
            .permissions
            .as_deref()
            .map(validate_permissions)
            .transpose()?;

        self.repo
            .update_role(&self.pool, role.id, name, permissions.as_deref())
            .await
    }

    /// Arquiva o cargo e limpa o cargo ativo de quem o usava.
    pub async fn archive_role(&self, company_id: Uuid, role_id: Uuid) -> Result<CompanyRole, AppError> {
        let role = self.find_editable_role(company_id, role_id).await?;

        let mut tx = self.pool.begin().await?;
        let archived = self.repo.archive_role(&mut *tx, role.id).await?;
        let cleared = self.repo.clear_active_role(&mut *tx, role.id).await?;
        tx.commit().await?;

        tracing::info!(%company_id, %role_id, cleared, "🗄️ Cargo arquivado");
        Ok(archived)
    }

    async fn find_editable_role(&self, company_id: Uuid, role_id: Uuid) -> Result<CompanyRole, AppError> {
        let role = self
            .repo
            .find_role(&self.pool, company_id, role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Cargo não encontrado."))?;

        if role.is_system {
            return Err(AppError::bad_request("Cargos de sistema não podem ser alterados."));
        }
        Ok(role)
    }
}

/// Garante que todas as chaves pertencem à lista fechada. Remove duplicatas
/// e devolve na forma canônica.
pub fn validate_permissions(input: &[String]) -> Result<Vec<String>, AppError> {
    let mut invalid = Vec::new();
    let mut keys: Vec<PermissionKey> = Vec::new();

    for raw in input {
        match raw.trim().parse::<PermissionKey>() {
            Ok(key) => {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            Err(()) => invalid.push(raw.as_str()),
        }
    }

    if !invalid.is_empty() {
        return Err(AppError::bad_request(format!(
            "Permissões inválidas: {}",
            invalid.join(", ")
        )));
    }

    keys.sort();
    Ok(keys.into_iter().map(|k| k.as_str().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_valid_permissions_are_deduplicated() {
        let perms = validate_permissions(&strings(&["stats.read", "inventory.read", "stats.read"])).unwrap();
        assert_eq!(perms, strings(&["inventory.read", "stats.read"]));
    }

    #[test]
    fn test_unknown_permissions_are_listed() {
        let err = validate_permissions(&strings(&["stats.read", "admin", "root.all"])).unwrap_err();
        assert_eq!(err.kind(), "BAD_REQUEST");
        let message = err.to_string();
        assert!(message.contains("admin"));
        assert!(message.contains("root.all"));
        assert!(!message.contains("stats.read"));
    }

    #[test]
    fn test_empty_permission_list_is_allowed() {
        assert!(validate_permissions(&[]).unwrap().is_empty());
    }
}
