// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

/// Monta o router principal. Tudo sob `/api/companies/{company_id}` é escopado à empresa.
pub fn app(app_state: AppState) -> Router {
    use crate::handlers::{
        annual, companies, inventory, invites, items, members, menu, roles, sales_cards, stats, users,
    };

    // Rotas de usuário
    let user_routes = Router::new()
        .route("/me", get(users::get_me))
        .route("/me/companies", get(users::get_my_companies));

    let invite_routes = Router::new().route("/accept", post(invites::accept_invite));

    // Empresas e tudo que pertence a uma empresa
    let company_routes = Router::new()
        .route("/", post(companies::create_company).get(companies::list_companies))
        .route(
            "/{company_id}",
            get(companies::get_company)
                .patch(companies::update_company)
                .delete(companies::archive_company),
        )
        // Locais
        .route(
            "/{company_id}/locations",
            get(companies::list_locations).post(companies::create_location),
        )
        .route(
            "/{company_id}/locations/{location_id}",
            axum::routing::patch(companies::update_location).delete(companies::archive_location),
        )
        // Cargos
        .route("/{company_id}/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/{company_id}/roles/{role_id}",
            axum::routing::patch(roles::update_role).delete(roles::archive_role),
        )
        // Membros
        .route("/{company_id}/members", get(members::list_members))
        .route(
            "/{company_id}/members/{membership_id}",
            axum::routing::patch(members::update_member).delete(members::archive_member),
        )
        .route("/{company_id}/members/{membership_id}/roles", post(members::add_member_role))
        .route(
            "/{company_id}/members/{membership_id}/roles/{role_id}",
            delete(members::remove_member_role),
        )
        .route(
            "/{company_id}/me",
            get(members::get_my_membership).patch(members::update_my_active_role),
        )
        // Convites
        .route(
            "/{company_id}/invites",
            get(invites::list_invites).post(invites::create_invite),
        )
        // Itens
        .route("/{company_id}/items", get(items::list_items).post(items::create_item))
        .route(
            "/{company_id}/items/{item_id}",
            axum::routing::patch(items::update_item).delete(items::archive_item),
        )
        // Contagens, reposições e estoque
        .route(
            "/{company_id}/snapshots",
            get(inventory::list_snapshots).post(inventory::create_snapshot),
        )
        .route("/{company_id}/snapshots/{snapshot_id}", get(inventory::get_snapshot))
        .route(
            "/{company_id}/restocks",
            get(inventory::list_restocks).post(inventory::create_restock),
        )
        .route("/{company_id}/restocks/{restock_id}", get(inventory::get_restock))
        .route("/{company_id}/stock", get(inventory::get_stock))
        // Turnos
        .route(
            "/{company_id}/sales-cards",
            get(sales_cards::list_cards).post(sales_cards::start_card),
        )
        .route("/{company_id}/sales-cards/active", get(sales_cards::active_card))
        .route(
            "/{company_id}/sales-cards/{card_id}",
            get(sales_cards::get_card).patch(sales_cards::update_card),
        )
        .route("/{company_id}/sales-cards/{card_id}/stop", post(sales_cards::stop_card))
        .route("/{company_id}/sales-cards/{card_id}/lock", post(sales_cards::lock_card))
        // Indicadores
        .route("/{company_id}/stats/kpis", get(stats::kpis))
        .route("/{company_id}/stats/sales-by-hour", get(stats::sales_by_hour))
        .route("/{company_id}/stats/sales-by-day", get(stats::sales_by_day))
        .route("/{company_id}/stats/sales-by-month", get(stats::sales_by_month))
        .route("/{company_id}/stats/sales", get(stats::sales))
        .route("/{company_id}/stats/sales-timeseries", get(stats::sales_timeseries))
        .route("/{company_id}/stats/bank-movements", get(stats::bank_movements))
        .route(
            "/{company_id}/annual",
            get(annual::list_annual).post(annual::upsert_annual_entry),
        )
        .route("/{company_id}/annual/{entry_id}", delete(annual::delete_annual_entry))
        // Cardápio
        .route("/{company_id}/menu", get(menu::list_menu).post(menu::create_menu_entry))
        .route("/{company_id}/menu/{entry_id}", delete(menu::delete_menu_entry));

    // Tudo abaixo exige Bearer válido
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/invites", invite_routes)
        .nest("/api/companies", company_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/permissions", get(roles::list_permissions))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_app() -> Router {
        // Pool preguiçoso: nenhuma destas rotas chega a tocar o banco
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        app(AppState::from_pool(pool, "segredo-de-teste".into()))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_permissions_list_is_public_and_complete() {
        let response = test_app()
            .oneshot(Request::builder().uri("/api/permissions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let keys = body.as_array().unwrap();
        assert_eq!(keys.len(), 18);
        assert!(keys.contains(&serde_json::json!("salesCards.edit.anyUnlocked")));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let company_id = uuid::Uuid::new_v4();
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/companies/{company_id}/sales-cards"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "UNAUTHENTICATED");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthenticated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/users/me")
                    .header(header::AUTHORIZATION, "Bearer isto.nao.vale")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["kind"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthenticated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/invites/accept")
                    .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"code":"ABC234"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
