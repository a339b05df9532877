use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ApiError;
use crate::services::auth_service::AuthService;

// DTO pour l'inscription / le renvoi de code
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
}

// DTO pour l'échange du code contre un token
#[derive(Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub confirmation_code: String,
}

// Réponse après signup
#[derive(Serialize)]
pub struct SignupResponse {
    pub email: String,
    pub username: String,
}

// Réponse après échange du code
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/v1/auth/signup - Demander un code de confirmation (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = AuthService::signup(db.get_ref(), &body.username, &body.email).await?;

    Ok(HttpResponse::Ok().json(SignupResponse {
        email: user.email,
        username: user.username,
    }))
}

/// POST /api/v1/auth/token - Échanger le code contre un bearer token (PUBLIC)
#[post("/token")]
pub async fn token(
    body: web::Json<TokenRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let token = AuthService::issue_token(db.get_ref(), &body.username, &body.confirmation_code)
        .await?;

    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").service(signup).service(token));
}
