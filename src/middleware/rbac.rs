// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::CompanyContext},
    models::rbac::{AccessContext, PermissionKey, Requirement},
};

/// 1. O Trait que define o que uma rota exige
pub trait PermissionDef: Send + Sync + 'static {
    const REQUIREMENT: Requirement;
}

/// 2. O Extractor (Guardião): só existe se a verificação passou
pub struct RequirePermission<T> {
    pub access: AccessContext,
    _perm: PhantomData<T>,
}

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A. Usuário (inserido pelo auth_guard)
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Empresa (do caminho)
        let CompanyContext(company_id) = CompanyContext::from_request_parts(parts, state).await?;

        // C. Snapshot + avaliação
        let access = app_state
            .authorization_service
            .check_permission(user.id, company_id, T::REQUIREMENT)
            .await?;

        Ok(RequirePermission { access, _perm: PhantomData })
    }
}

/// Apenas associação ativa à empresa do caminho (sem permissão específica).
pub struct CompanyMember(pub AccessContext);

impl<S> FromRequestParts<S> for CompanyMember
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        let CompanyContext(company_id) = CompanyContext::from_request_parts(parts, state).await?;

        let access = app_state
            .authorization_service
            .check_access(user.id, company_id)
            .await?;

        Ok(CompanyMember(access))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, all: [$($key:ident),+]) => {
        pub struct $name;
        impl PermissionDef for $name {
            const REQUIREMENT: Requirement = Requirement::All(&[$(PermissionKey::$key),+]);
        }
    };
    ($name:ident, any: [$($key:ident),+]) => {
        pub struct $name;
        impl PermissionDef for $name {
            const REQUIREMENT: Requirement = Requirement::Any(&[$(PermissionKey::$key),+]);
        }
    };
}

permission!(PermCompanyUpdate, all: [CompanyUpdate]);
permission!(PermCompanyArchive, all: [CompanyArchive]);

permission!(PermRolesManage, all: [RolesManage]);
permission!(PermMembersRead, all: [MembersRead]);
permission!(PermMembersInvite, all: [MembersInvite]);
permission!(PermMembersUpdateRole, all: [MembersUpdateRole]);

permission!(PermInventoryRead, all: [InventoryRead]);
permission!(PermInventoryWrite, all: [InventoryWrite]);
permission!(PermSnapshotCreate, all: [InventorySnapshotCreate]);

permission!(PermSalesCardsRead, all: [SalesCardsRead]);
permission!(PermSalesCardsCreate, all: [SalesCardsCreate]);
permission!(PermSalesCardsEdit, any: [SalesCardsEditAnyUnlocked, SalesCardsEditOwnDraft]);
permission!(PermSalesCardsStop, any: [SalesCardsStopAnyDraft, SalesCardsStopOwnDraft]);
permission!(PermSalesCardsLock, all: [SalesCardsLock]);

permission!(PermStatsRead, all: [StatsRead]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_requirements() {
        assert!(matches!(
            PermInventoryWrite::REQUIREMENT,
            Requirement::All([PermissionKey::InventoryWrite])
        ));
        match PermSalesCardsEdit::REQUIREMENT {
            Requirement::Any(keys) => assert_eq!(
                keys,
                &[PermissionKey::SalesCardsEditAnyUnlocked, PermissionKey::SalesCardsEditOwnDraft]
            ),
            Requirement::All(_) => panic!("edição aceita qualquer uma das chaves"),
        }
    }
}
