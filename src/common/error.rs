// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

// Nosso tipo de erro de domínio. Cada variante tem um "kind" estável
// (para o frontend decidir o que fazer) e uma mensagem legível.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Um ou mais campos são inválidos.")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token de autenticação inválido ou ausente.")]
    Unauthenticated,

    #[error("Usuário não encontrado.")]
    UserNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    // Violação de unicidade: `fields` aponta os campos do formulário a destacar
    #[error("{message}")]
    Conflict { message: String, fields: Vec<String> },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>, fields: &[&str]) -> Self {
        AppError::Conflict {
            message: message.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Código estável, independente da mensagem.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthenticated | AppError::UserNotFound => "UNAUTHENTICATED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte o erro de domínio no corpo que vai para o cliente.
    pub fn to_api_error(&self) -> ApiError {
        let status = self.status();
        let kind = self.kind();

        match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    kind,
                    error: self.to_string(),
                    fields: None,
                    details: Some(details),
                }
            }
            AppError::Conflict { message, fields } => ApiError {
                status,
                kind,
                error: message.clone(),
                fields: Some(fields.clone()),
                details: None,
            },
            // Erros internos: logamos o detalhe, o cliente recebe mensagem genérica.
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {}", self);
                ApiError {
                    status,
                    kind,
                    error: "Ocorreu um erro inesperado.".to_string(),
                    fields: None,
                    details: None,
                }
            }
            _ => ApiError {
                status,
                kind,
                error: self.to_string(),
                fields: None,
                details: None,
            },
        }
    }
}

// O corpo de erro padronizado da API
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub kind: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x", &["slug"]).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_conflict_body_carries_fields() {
        let api = AppError::conflict("Já existe uma empresa com este slug.", &["slug"]).to_api_error();
        let body = serde_json::to_value(&api).unwrap();

        assert_eq!(body["kind"], "CONFLICT");
        assert_eq!(body["fields"], serde_json::json!(["slug"]));
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let api = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123")).to_api_error();
        assert_eq!(api.kind, "INTERNAL");
        assert!(!api.error.contains("123"));
    }

    #[test]
    fn test_validation_errors_are_bad_request_with_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("name", err);

        let api = AppError::ValidationError(errors).to_api_error();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.kind, "BAD_REQUEST");
        let details = api.details.unwrap();
        assert_eq!(details["name"], vec!["O nome é obrigatório.".to_string()]);
    }
}
