// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Tradução de violações de unicidade
// ---
// Cada constraint/índice único do schema aponta para o(s) campo(s) do payload
// que o cliente deve destacar.
const CONSTRAINT_FIELDS: &[(&str, &[&str])] = &[
    ("companies_slug_key", &["slug"]),
    ("company_locations_company_name_key", &["name"]),
    ("company_roles_company_key_key", &["key"]),
    ("memberships_active_user_company_key", &["userId"]),
    ("membership_roles_membership_role_key", &["roleId"]),
    ("invites_code_key", &["code"]),
    ("items_company_name_key", &["name"]),
    ("menu_entries_company_item_key", &["itemId"]),
    ("sales_cards_one_draft_key", &["userId"]),
    ("inventory_snapshot_lines_snapshot_item_key", &["itemId"]),
    ("restock_lines_restock_item_key", &["itemId"]),
    ("sales_card_lines_card_item_key", &["itemId"]),
    ("annual_entries_company_date_key", &["date"]),
];

/// Campos associados a uma constraint. Constraints desconhecidas não apontam campo algum.
pub fn fields_for_constraint(constraint: &str) -> &'static [&'static str] {
    CONSTRAINT_FIELDS
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// Nome da constraint violada, se o erro for uma violação de unicidade.
pub fn unique_violation(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Converte violações de unicidade em `Conflict` (com os campos da constraint);
/// qualquer outro erro segue como erro de banco.
pub fn conflict_or_db(error: sqlx::Error, message: &str) -> AppError {
    match unique_violation(&error) {
        Some(constraint) => AppError::conflict(message, fields_for_constraint(&constraint)),
        None => AppError::DatabaseError(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_constraints_map_to_fields() {
        assert_eq!(fields_for_constraint("companies_slug_key"), &["slug"]);
        assert_eq!(fields_for_constraint("items_company_name_key"), &["name"]);
        assert_eq!(fields_for_constraint("annual_entries_company_date_key"), &["date"]);
    }

    #[test]
    fn test_unknown_constraint_has_no_fields() {
        assert!(fields_for_constraint("whatever_key").is_empty());
    }

    #[test]
    fn test_non_database_errors_are_not_conflicts() {
        let err = conflict_or_db(sqlx::Error::RowNotFound, "duplicado");
        assert_eq!(err.kind(), "INTERNAL");
        assert!(unique_violation(&sqlx::Error::PoolTimedOut).is_none());
    }
}
