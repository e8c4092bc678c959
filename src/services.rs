// src/services.rs

pub mod analytics_service;
pub mod annual_service;
pub mod auth;
pub mod authorization_service;
pub mod bank_service;
pub mod company_service;
pub mod inventory_service;
pub mod invite_service;
pub mod member_service;
pub mod menu_service;
pub mod rbac_service;
pub mod sales_card_service;
