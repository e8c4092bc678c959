// src/handlers.rs

pub mod annual;
pub mod companies;
pub mod inventory;
pub mod invites;
pub mod items;
pub mod members;
pub mod menu;
pub mod roles;
pub mod sales_cards;
pub mod stats;
pub mod users;
