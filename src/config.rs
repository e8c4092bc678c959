// src/config.rs

use crate::{
    db::{
        AnalyticsRepository, BankRepository, CompanyRepository, InventoryRepository, InviteRepository,
        MenuRepository, RbacRepository, SalesCardRepository, UserRepository,
    },
    services::{
        analytics_service::AnalyticsService, annual_service::AnnualService, auth::AuthService,
        authorization_service::AuthorizationService, bank_service::BankService,
        company_service::CompanyService, inventory_service::InventoryService,
        invite_service::InviteService, member_service::MemberService, menu_service::MenuService,
        rbac_service::RbacService, sales_card_service::SalesCardService,
    },
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {raw}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self { database_url, jwt_secret, bind_addr, db_max_connections })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,

    pub auth_service: AuthService,
    pub authorization_service: AuthorizationService,
    pub company_service: CompanyService,
    pub rbac_service: RbacService,
    pub member_service: MemberService,
    pub invite_service: InviteService,
    pub inventory_service: InventoryService,
    pub sales_card_service: SalesCardService,
    pub bank_service: BankService,
    pub analytics_service: AnalyticsService,
    pub annual_service: AnnualService,
    pub menu_service: MenuService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config.jwt_secret.clone()))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let invite_repo = InviteRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let sales_card_repo = SalesCardRepository::new(db_pool.clone());
        let bank_repo = BankRepository::new(db_pool.clone());
        let analytics_repo = AnalyticsRepository::new(db_pool.clone());
        let menu_repo = MenuRepository::new(db_pool.clone());

        let bank_service = BankService::new(bank_repo);

        Self {
            auth_service: AuthService::new(user_repo, jwt_secret),
            authorization_service: AuthorizationService::new(rbac_repo.clone()),
            company_service: CompanyService::new(
                company_repo.clone(),
                rbac_repo.clone(),
                bank_service.clone(),
                db_pool.clone(),
            ),
            rbac_service: RbacService::new(rbac_repo.clone(), db_pool.clone()),
            member_service: MemberService::new(rbac_repo.clone(), company_repo.clone(), db_pool.clone()),
            invite_service: InviteService::new(invite_repo, rbac_repo.clone(), db_pool.clone()),
            inventory_service: InventoryService::new(inventory_repo.clone(), bank_service.clone(), db_pool.clone()),
            sales_card_service: SalesCardService::new(
                sales_card_repo,
                inventory_repo.clone(),
                rbac_repo,
                company_repo,
                bank_service.clone(),
                db_pool.clone(),
            ),
            bank_service,
            analytics_service: AnalyticsService::new(analytics_repo.clone()),
            annual_service: AnnualService::new(analytics_repo),
            menu_service: MenuService::new(menu_repo, inventory_repo, db_pool.clone()),
            db_pool,
        }
    }
}
