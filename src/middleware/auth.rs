use actix_web::{dev::Payload, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::utils::jwt;

/// Identité portée par le bearer token, extraite sur les routes protégées.
/// Le rôle n'est PAS dans le token: il est relu en base à chaque requête
/// (auth_service::principal) pour qu'un changement de rôle prenne effet
/// immédiatement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_bearer(req))
    }
}

fn extract_bearer(req: &HttpRequest) -> Result<AuthUser, Error> {
    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Unauthenticated("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthenticated("Invalid Authorization header".to_string()))?;

    // 2. Extraire le token (format: "Bearer <token>")
    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthenticated(
            "Invalid Authorization format (expected: Bearer <token>)".to_string(),
        )
    })?;

    // 3. Vérifier le token JWT
    let claims = jwt::verify_token(token)
        .map_err(|e| ApiError::Unauthenticated(format!("Invalid token: {}", e)))?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
    })
}
