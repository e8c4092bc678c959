// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Permissões (lista fechada)
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum PermissionKey {
    #[serde(rename = "company.read")]
    CompanyRead,
    #[serde(rename = "company.update")]
    CompanyUpdate,
    #[serde(rename = "company.archive")]
    CompanyArchive,
    #[serde(rename = "members.read")]
    MembersRead,
    #[serde(rename = "members.invite")]
    MembersInvite,
    #[serde(rename = "members.updateRole")]
    MembersUpdateRole,
    #[serde(rename = "roles.manage")]
    RolesManage,
    #[serde(rename = "inventory.read")]
    InventoryRead,
    #[serde(rename = "inventory.write")]
    InventoryWrite,
    #[serde(rename = "inventory.snapshot.create")]
    InventorySnapshotCreate,
    #[serde(rename = "salesCards.read")]
    SalesCardsRead,
    #[serde(rename = "salesCards.create")]
    SalesCardsCreate,
    #[serde(rename = "salesCards.edit.anyUnlocked")]
    SalesCardsEditAnyUnlocked,
    #[serde(rename = "salesCards.edit.ownDraft")]
    SalesCardsEditOwnDraft,
    #[serde(rename = "salesCards.stop.anyDraft")]
    SalesCardsStopAnyDraft,
    #[serde(rename = "salesCards.stop.ownDraft")]
    SalesCardsStopOwnDraft,
    #[serde(rename = "salesCards.lock")]
    SalesCardsLock,
    #[serde(rename = "stats.read")]
    StatsRead,
}

impl PermissionKey {
    pub const ALL: [PermissionKey; 18] = [
        PermissionKey::CompanyRead,
        PermissionKey::CompanyUpdate,
        PermissionKey::CompanyArchive,
        PermissionKey::MembersRead,
        PermissionKey::MembersInvite,
        PermissionKey::MembersUpdateRole,
        PermissionKey::RolesManage,
        PermissionKey::InventoryRead,
        PermissionKey::InventoryWrite,
        PermissionKey::InventorySnapshotCreate,
        PermissionKey::SalesCardsRead,
        PermissionKey::SalesCardsCreate,
        PermissionKey::SalesCardsEditAnyUnlocked,
        PermissionKey::SalesCardsEditOwnDraft,
        PermissionKey::SalesCardsStopAnyDraft,
        PermissionKey::SalesCardsStopOwnDraft,
        PermissionKey::SalesCardsLock,
        PermissionKey::StatsRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKey::CompanyRead => "company.read",
            PermissionKey::CompanyUpdate => "company.update",
            PermissionKey::CompanyArchive => "company.archive",
            PermissionKey::MembersRead => "members.read",
            PermissionKey::MembersInvite => "members.invite",
            PermissionKey::MembersUpdateRole => "members.updateRole",
            PermissionKey::RolesManage => "roles.manage",
            PermissionKey::InventoryRead => "inventory.read",
            PermissionKey::InventoryWrite => "inventory.write",
            PermissionKey::InventorySnapshotCreate => "inventory.snapshot.create",
            PermissionKey::SalesCardsRead => "salesCards.read",
            PermissionKey::SalesCardsCreate => "salesCards.create",
            PermissionKey::SalesCardsEditAnyUnlocked => "salesCards.edit.anyUnlocked",
            PermissionKey::SalesCardsEditOwnDraft => "salesCards.edit.ownDraft",
            PermissionKey::SalesCardsStopAnyDraft => "salesCards.stop.anyDraft",
            PermissionKey::SalesCardsStopOwnDraft => "salesCards.stop.ownDraft",
            PermissionKey::SalesCardsLock => "salesCards.lock",
            PermissionKey::StatsRead => "stats.read",
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or(())
    }
}

/// O que uma rota exige: todas as chaves, ou ao menos uma delas.
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    All(&'static [PermissionKey]),
    Any(&'static [PermissionKey]),
}

// ---
// Cargos e associações
// ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRole {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Bartender")]
    pub name: String,
    #[schema(example = "bartender")]
    pub key: String,
    #[schema(example = json!(["salesCards.create", "salesCards.edit.ownDraft"]))]
    pub permissions: Vec<String>,
    pub is_system: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub active_role_id: Option<Uuid>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da listagem de membros (associação + dados do usuário)
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub active_role_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Cargo vinculado a uma associação
#[derive(Debug, Clone, FromRow)]
pub struct MemberRoleRow {
    pub membership_id: Uuid,
    pub role_id: Uuid,
    pub name: String,
    pub key: String,
    pub permissions: Vec<String>,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub is_system: bool,
}

impl From<MemberRoleRow> for RoleSummary {
    fn from(row: MemberRoleRow) -> Self {
        Self {
            id: row.role_id,
            name: row.name,
            key: row.key,
            is_system: row.is_system,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_owner: bool,
    pub active_role_id: Option<Uuid>,
    pub roles: Vec<RoleSummary>,
    pub joined_at: DateTime<Utc>,
}

// "Minha associação" numa empresa
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyMembership {
    pub membership_id: Uuid,
    pub company_id: Uuid,
    pub is_owner: bool,
    pub active_role_id: Option<Uuid>,
    pub roles: Vec<RoleSummary>,
    #[schema(value_type = Vec<String>)]
    pub permissions: Vec<PermissionKey>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 80, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "Bartender")]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "A chave deve ter entre 1 e 32 caracteres."))]
    pub key: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["salesCards.create"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, max = 80, message = "O nome do cargo não pode ser vazio."))]
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRolePayload {
    // null limpa o cargo ativo
    pub active_role_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberRolePayload {
    pub role_id: Uuid,
}

// ---
// Snapshot de acesso (lido uma vez por verificação)
// ---

// Linha bruta: associação + empresa + (talvez) um cargo vinculado
#[derive(Debug, Clone, FromRow)]
pub struct AccessRow {
    pub membership_id: Uuid,
    pub active_role_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub company_archived_at: Option<DateTime<Utc>>,
    pub role_id: Option<Uuid>,
    pub role_name: Option<String>,
    pub role_permissions: Option<Vec<String>>,
    pub role_archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub role_id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
    pub archived: bool,
}

#[derive(Debug, Clone)]
pub struct AccessSnapshot {
    pub membership_id: Uuid,
    pub active_role_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub company_archived: bool,
    pub roles: Vec<RoleGrant>,
}

impl AccessSnapshot {
    /// Agrupa as linhas do JOIN. Sem linhas = sem associação.
    pub fn from_rows(rows: Vec<AccessRow>) -> Option<Self> {
        let first = rows.first()?;
        let mut snapshot = AccessSnapshot {
            membership_id: first.membership_id,
            active_role_id: first.active_role_id,
            owner_id: first.owner_id,
            company_archived: first.company_archived_at.is_some(),
            roles: Vec::new(),
        };

        for row in rows {
            if let (Some(role_id), Some(name)) = (row.role_id, row.role_name) {
                snapshot.roles.push(RoleGrant {
                    role_id,
                    name,
                    permissions: row.role_permissions.unwrap_or_default(),
                    archived: row.role_archived_at.is_some(),
                });
            }
        }
        Some(snapshot)
    }

    /// União das permissões dos cargos não arquivados. Strings fora da lista são ignoradas.
    pub fn effective_permissions(&self) -> BTreeSet<PermissionKey> {
        self.roles
            .iter()
            .filter(|role| !role.archived)
            .flat_map(|role| role.permissions.iter())
            .filter_map(|p| p.parse().ok())
            .collect()
    }
}

/// Resultado de uma verificação bem-sucedida; repassado aos serviços.
#[derive(Debug, Clone)]
pub struct AccessContext {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub membership_id: Uuid,
    pub is_owner: bool,
    pub permissions: BTreeSet<PermissionKey>,
}

impl AccessContext {
    pub fn has(&self, key: PermissionKey) -> bool {
        self.is_owner || self.permissions.contains(&key)
    }

    pub fn effective_permissions(&self) -> Vec<PermissionKey> {
        if self.is_owner {
            PermissionKey::ALL.to_vec()
        } else {
            self.permissions.iter().copied().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_keys_round_trip_through_strings() {
        for key in PermissionKey::ALL {
            assert_eq!(key.as_str().parse::<PermissionKey>(), Ok(key));
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
        assert!("inventory:write".parse::<PermissionKey>().is_err());
    }

    fn row(role: Option<AccessRole>) -> AccessRow {
        AccessRow {
            membership_id: Uuid::nil(),
            active_role_id: None,
            owner_id: Uuid::nil(),
            company_archived_at: None,
            role_id: role.as_ref().map(|_| Uuid::new_v4()),
            role_name: role.as_ref().map(|r| r.name.to_string()),
            role_permissions: role
                .as_ref()
                .map(|r| r.permissions.iter().map(|p| p.to_string()).collect()),
            role_archived_at: role.and_then(|r| r.archived.then(Utc::now)),
        }
    }

    struct AccessRole {
        name: &'static str,
        permissions: Vec<&'static str>,
        archived: bool,
    }

    fn role(name: &'static str, permissions: Vec<&'static str>, archived: bool) -> Option<AccessRole> {
        Some(AccessRole { name, permissions, archived })
    }

    #[test]
    fn test_snapshot_without_rows_is_none() {
        assert!(AccessSnapshot::from_rows(vec![]).is_none());
    }

    #[test]
    fn test_snapshot_unions_only_active_roles() {
        let snapshot = AccessSnapshot::from_rows(vec![
            row(role("Bartender", vec!["salesCards.create", "inventory.read"], false)),
            row(role("Gerente", vec!["stats.read"], true)),
            row(role("Legado", vec!["something.else"], false)),
        ])
        .unwrap();

        let perms = snapshot.effective_permissions();
        assert!(perms.contains(&PermissionKey::SalesCardsCreate));
        assert!(perms.contains(&PermissionKey::InventoryRead));
        assert!(!perms.contains(&PermissionKey::StatsRead));
        assert_eq!(perms.len(), 2);
    }

    #[test]
    fn test_membership_without_roles_has_empty_snapshot() {
        let snapshot = AccessSnapshot::from_rows(vec![row(None)]).unwrap();
        assert!(snapshot.roles.is_empty());
        assert!(snapshot.effective_permissions().is_empty());
    }
}
