// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::users::get_me,
        handlers::users::get_my_companies,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::update_company,
        handlers::companies::archive_company,
        handlers::companies::list_locations,
        handlers::companies::create_location,
        handlers::companies::update_location,
        handlers::companies::archive_location,

        // --- RBAC ---
        handlers::roles::list_permissions,
        handlers::roles::list_roles,
        handlers::roles::create_role,
        handlers::roles::update_role,
        handlers::roles::archive_role,

        // --- Members ---
        handlers::members::list_members,
        handlers::members::update_member,
        handlers::members::add_member_role,
        handlers::members::remove_member_role,
        handlers::members::archive_member,
        handlers::members::get_my_membership,
        handlers::members::update_my_active_role,

        // --- Invites ---
        handlers::invites::create_invite,
        handlers::invites::list_invites,
        handlers::invites::accept_invite,

        // --- INVENTORY ---
        handlers::items::list_items,
        handlers::items::create_item,
        handlers::items::update_item,
        handlers::items::archive_item,
        handlers::inventory::create_snapshot,
        handlers::inventory::list_snapshots,
        handlers::inventory::get_snapshot,
        handlers::inventory::create_restock,
        handlers::inventory::list_restocks,
        handlers::inventory::get_restock,
        handlers::inventory::get_stock,

        // --- Sales Cards ---
        handlers::sales_cards::list_cards,
        handlers::sales_cards::active_card,
        handlers::sales_cards::start_card,
        handlers::sales_cards::get_card,
        handlers::sales_cards::update_card,
        handlers::sales_cards::stop_card,
        handlers::sales_cards::lock_card,

        // --- Stats ---
        handlers::stats::kpis,
        handlers::stats::sales_by_hour,
        handlers::stats::sales_by_day,
        handlers::stats::sales_by_month,
        handlers::stats::sales,
        handlers::stats::sales_timeseries,
        handlers::stats::bank_movements,
        handlers::annual::list_annual,
        handlers::annual::upsert_annual_entry,
        handlers::annual::delete_annual_entry,

        // --- Menu ---
        handlers::menu::list_menu,
        handlers::menu::create_menu_entry,
        handlers::menu::delete_menu_entry,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,

            // --- Companies ---
            models::company::CompanyType,
            models::company::Company,
            models::company::CompanyLocation,
            models::company::CreatedCompany,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,
            models::company::LocationPayload,

            // --- RBAC ---
            models::rbac::PermissionKey,
            models::rbac::CompanyRole,
            models::rbac::Membership,
            models::rbac::RoleSummary,
            models::rbac::MemberView,
            models::rbac::MyMembership,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::SetActiveRolePayload,
            models::rbac::MemberRolePayload,

            // --- Invites ---
            models::invite::InviteStatus,
            models::invite::Invite,
            models::invite::CreateInvitePayload,
            models::invite::AcceptInvitePayload,
            models::invite::AcceptedInvite,

            // --- Inventory ---
            models::inventory::ItemCategory,
            models::inventory::Item,
            models::inventory::CreateItemPayload,
            models::inventory::UpdateItemPayload,
            models::inventory::InventorySnapshot,
            models::inventory::SnapshotSummary,
            models::inventory::SnapshotLineView,
            models::inventory::SnapshotDetail,
            models::inventory::SnapshotLinePayload,
            models::inventory::CreateSnapshotPayload,
            models::inventory::Restock,
            models::inventory::RestockSummary,
            models::inventory::RestockLineView,
            models::inventory::RestockDetail,
            models::inventory::RestockLinePayload,
            models::inventory::CreateRestockPayload,
            models::inventory::StockRow,

            // --- Sales Cards ---
            models::sales_card::SalesCardStatus,
            models::sales_card::SalesCard,
            models::sales_card::SalesCardSummary,
            models::sales_card::SalesCardLineView,
            models::sales_card::SalesCardDetail,
            models::sales_card::StartSalesCardPayload,
            models::sales_card::SalesCardLinePayload,
            models::sales_card::UpdateSalesCardPayload,
            models::sales_card::StopSalesCardPayload,

            // --- Bank ---
            models::bank::BankMovementType,
            models::bank::BankMovement,

            // --- Stats ---
            models::analytics::Kpis,
            models::analytics::HourBucket,
            models::analytics::DayBucket,
            models::analytics::MonthBucket,
            models::analytics::SalesBuckets,
            models::analytics::TimeseriesPoint,
            models::analytics::AnnualSource,
            models::analytics::AnnualEntry,
            models::analytics::AnnualRow,
            models::analytics::AnnualEntryPayload,

            // --- Menu ---
            models::menu::MenuEntryKind,
            models::menu::MenuEntryView,
            models::menu::CreateMenuEntryPayload,
        )
    ),
    tags(
        (name = "Users", description = "Dados do Usuário"),
        (name = "Companies", description = "Empresas e Locais"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Members", description = "Membros e Cargos Vinculados"),
        (name = "Invites", description = "Convites por Código"),
        (name = "Inventory", description = "Itens, Contagens, Reposições e Estoque"),
        (name = "Sales Cards", description = "Turnos de Venda"),
        (name = "Stats", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Annual Report", description = "Relatório Anual"),
        (name = "Menu", description = "Cardápio")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_company_scoped_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/companies/{company_id}/sales-cards/{card_id}/stop"));
        assert!(doc.paths.paths.contains_key("/api/invites/accept"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
