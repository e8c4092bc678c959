// src/services/member_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{CompanyRepository, RbacRepository};
use crate::models::rbac::{AccessContext, MemberRoleRow, MemberView, Membership, MyMembership, RoleSummary};

#[derive(Clone)]
pub struct MemberService {
    rbac_repo: RbacRepository,
    company_repo: CompanyRepository,
    pool: PgPool,
}

impl MemberService {
    pub fn new(rbac_repo: RbacRepository, company_repo: CompanyRepository, pool: PgPool) -> Self {
        Self { rbac_repo, company_repo, pool }
    }

    pub async fn list_members(&self, company_id: Uuid) -> Result<Vec<MemberView>, AppError> {
        let company = self
            .company_repo
            .find_company(&self.pool, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa não encontrada."))?;

        let members = self.rbac_repo.list_members(company_id).await?;
        let ids: Vec<Uuid> = members.iter().map(|m| m.membership_id).collect();
        let mut roles_by_member = group_roles(self.rbac_repo.list_membership_roles(&self.pool, &ids).await?);

        Ok(members
            .into_iter()
            .map(|m| MemberView {
                is_owner: m.user_id == company.owner_id,
                roles: roles_by_member.remove(&m.membership_id).unwrap_or_default(),
                membership_id: m.membership_id,
                user_id: m.user_id,
                email: m.email,
                name: m.name,
                active_role_id: m.active_role_id,
                joined_at: m.created_at,
            })
            .collect())
    }

    /// Cargo ativo de um membro; precisa ser um cargo que ele possui (ou null).
    pub async fn update_member(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
        active_role_id: Option<Uuid>,
    ) -> Result<Membership, AppError> {
        let membership = self.find_membership(company_id, membership_id).await?;
        self.set_active_role(membership, active_role_id).await
    }

    pub async fn add_member_role(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> Result<Vec<RoleSummary>, AppError> {
        let membership = self.find_membership(company_id, membership_id).await?;

        let role = self
            .rbac_repo
            .find_role(&self.pool, company_id, role_id)
            .await?
            .ok_or_else(|| AppError::bad_request("Cargo inválido para esta empresa."))?;

        if role.is_system {
            return Err(AppError::bad_request("Cargos de sistema não podem ser atribuídos."));
        }

        self.rbac_repo
            .add_membership_role(&self.pool, membership.id, role.id)
            .await?;

        self.roles_of(membership.id).await
    }

    /// Remove o cargo; se era o ativo, o ativo passa para o primeiro restante (ou nenhum).
    pub async fn remove_member_role(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> Result<Vec<RoleSummary>, AppError> {
        let membership = self.find_membership(company_id, membership_id).await?;

        let mut tx = self.pool.begin().await?;

        let removed = self
            .rbac_repo
            .remove_membership_role(&mut *tx, membership.id, role_id)
            .await?;
        if removed == 0 {
            return Err(AppError::not_found("O membro não possui este cargo."));
        }

        let remaining = self
            .rbac_repo
            .list_membership_roles(&mut *tx, &[membership.id])
            .await?;

        if membership.active_role_id == Some(role_id) {
            let next = remaining.first().map(|r| r.role_id);
            self.rbac_repo.set_active_role(&mut *tx, membership.id, next).await?;
        }

        tx.commit().await?;

        Ok(remaining.into_iter().map(RoleSummary::from).collect())
    }

    pub async fn archive_member(&self, company_id: Uuid, membership_id: Uuid) -> Result<Membership, AppError> {
        let membership = self.find_membership(company_id, membership_id).await?;

        let company = self
            .company_repo
            .find_company(&self.pool, company_id)
            .await?
            .ok_or_else(|| AppError::not_found("Empresa não encontrada."))?;

        if membership.user_id == company.owner_id {
            return Err(AppError::bad_request("O dono da empresa não pode ser removido."));
        }

        let archived = self.rbac_repo.archive_membership(&self.pool, membership.id).await?;
        tracing::info!(%company_id, %membership_id, "👋 Membro arquivado");
        Ok(archived)
    }

    // ---
    // "Minha" associação
    // ---

    pub async fn get_my_membership(&self, access: &AccessContext) -> Result<MyMembership, AppError> {
        let membership = self.find_membership(access.company_id, access.membership_id).await?;
        let roles = self.roles_of(membership.id).await?;

        Ok(MyMembership {
            membership_id: membership.id,
            company_id: membership.company_id,
            is_owner: access.is_owner,
            active_role_id: membership.active_role_id,
            roles,
            permissions: access.effective_permissions(),
        })
    }

    pub async fn update_my_active_role(
        &self,
        access: &AccessContext,
        active_role_id: Option<Uuid>,
    ) -> Result<MyMembership, AppError> {
        let membership = self.find_membership(access.company_id, access.membership_id).await?;
        self.set_active_role(membership, active_role_id).await?;
        self.get_my_membership(access).await
    }

    async fn set_active_role(
        &self,
        membership: Membership,
        active_role_id: Option<Uuid>,
    ) -> Result<Membership, AppError> {
        if let Some(role_id) = active_role_id {
            let held = self.roles_of(membership.id).await?;
            if !held.iter().any(|r| r.id == role_id) {
                return Err(AppError::bad_request("O cargo ativo precisa ser um dos cargos do membro."));
            }
        }

        self.rbac_repo
            .set_active_role(&self.pool, membership.id, active_role_id)
            .await
    }

    async fn roles_of(&self, membership_id: Uuid) -> Result<Vec<RoleSummary>, AppError> {
        let rows = self
            .rbac_repo
            .list_membership_roles(&self.pool, &[membership_id])
            .await?;
        Ok(rows.into_iter().map(RoleSummary::from).collect())
    }

    async fn find_membership(&self, company_id: Uuid, membership_id: Uuid) -> Result<Membership, AppError> {
        self.rbac_repo
            .find_membership(&self.pool, company_id, membership_id)
            .await?
            .ok_or_else(|| AppError::not_found("Membro não encontrado."))
    }
}

// Agrupa os cargos por associação, preservando a ordem da consulta
fn group_roles(rows: Vec<MemberRoleRow>) -> HashMap<Uuid, Vec<RoleSummary>> {
    let mut grouped: HashMap<Uuid, Vec<RoleSummary>> = HashMap::new();
    for row in rows {
        grouped.entry(row.membership_id).or_default().push(RoleSummary::from(row));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_row(membership_id: Uuid, name: &str) -> MemberRoleRow {
        MemberRoleRow {
            membership_id,
            role_id: Uuid::new_v4(),
            name: name.to_string(),
            key: name.to_lowercase(),
            permissions: vec![],
            is_system: false,
        }
    }

    #[test]
    fn test_group_roles_keeps_query_order_per_member() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = group_roles(vec![
            role_row(a, "Bartender"),
            role_row(b, "Caixa"),
            role_row(a, "Gerente"),
        ]);

        let names: Vec<&str> = grouped[&a].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Bartender", "Gerente"]);
        assert_eq!(grouped[&b].len(), 1);
    }
}
