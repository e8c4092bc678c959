// src/models.rs

pub mod analytics;
pub mod auth;
pub mod bank;
pub mod company;
pub mod inventory;
pub mod invite;
pub mod menu;
pub mod rbac;
pub mod sales_card;

use serde::{Deserialize, Deserializer};

// Distingue "campo ausente" (None) de "campo enviado como null" (Some(None))
// em payloads de atualização parcial.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
