// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::request::Parts,
};
use uuid::Uuid;

use crate::common::error::AppError;

// Nome do parâmetro de rota que identifica a empresa
const COMPANY_ID_PARAM: &str = "company_id";

// A empresa alvo da requisição, sempre lida do caminho `/api/companies/{company_id}/...`
#[derive(Debug, Clone, Copy)]
pub struct CompanyContext(pub Uuid);

impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("O identificador da empresa é obrigatório."))?;

        let raw = params
            .iter()
            .find(|(name, _)| *name == COMPANY_ID_PARAM)
            .map(|(_, value)| value)
            .ok_or_else(|| AppError::bad_request("O identificador da empresa é obrigatório."))?;

        parse_company_id(raw).map(CompanyContext)
    }
}

pub fn parse_company_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::bad_request("Identificador de empresa inválido (não é um UUID)."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_company_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_company_id(&id.to_string()).unwrap(), id);
        assert_eq!(parse_company_id("loja-1").unwrap_err().kind(), "BAD_REQUEST");
    }
}
