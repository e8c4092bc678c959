// src/db.rs

pub mod analytics_repo;
pub mod bank_repo;
pub mod company_repo;
pub mod inventory_repo;
pub mod invite_repo;
pub mod menu_repo;
pub mod rbac_repo;
pub mod sales_card_repo;
pub mod user_repo;

pub use analytics_repo::AnalyticsRepository;
pub use bank_repo::BankRepository;
pub use company_repo::CompanyRepository;
pub use inventory_repo::InventoryRepository;
pub use invite_repo::InviteRepository;
pub use menu_repo::MenuRepository;
pub use rbac_repo::RbacRepository;
pub use sales_card_repo::SalesCardRepository;
pub use user_repo::UserRepository;
