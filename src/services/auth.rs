// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

// O provedor de autenticação emite os tokens; aqui apenas validamos (HS256)
// e carregamos o usuário correspondente.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self { user_repo, jwt_secret }
    }

    pub fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Token rejeitado: {}", e);
            AppError::Unauthenticated
        })?;

        Ok(token_data.claims)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_claims(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool), secret.to_string())
    }

    fn token(secret: &str, sub: Uuid, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub,
            exp: (now + exp_offset_secs) as usize,
            iat: now as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_subject() {
        let user_id = Uuid::new_v4();
        let claims = service("segredo")
            .decode_claims(&token("segredo", user_id, 3600))
            .unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthenticated() {
        let err = service("segredo")
            .decode_claims(&token("outro", Uuid::new_v4(), 3600))
            .unwrap_err();
        assert_eq!(err.kind(), "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthenticated() {
        let err = service("segredo")
            .decode_claims(&token("segredo", Uuid::new_v4(), -3600))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        assert!(service("segredo").decode_claims("nao-e-um-jwt").is_err());
    }
}
