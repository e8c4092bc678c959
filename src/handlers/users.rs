// src/handlers/users.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{auth::User, company::Company},
};

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(user))
}

// GET /api/users/me/companies
#[utoipa::path(
    get,
    path = "/api/users/me/companies",
    tag = "Users",
    responses(
        (status = 200, description = "Empresas das quais o usuário é membro", body = Vec<Company>),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_my_companies(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.company_service.list_my_companies(user.id).await?;
    Ok(Json(companies))
}
