use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
};
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateUserRequest, PageQuery, UpdateUserRequest, UserResponse};
use crate::models::users;
use crate::services::auth_service::AuthService;
use crate::services::permission_service::{check_route, ResourceClass, Verb};
use crate::services::resolver_service;
use crate::services::user_service::UserService;
use crate::utils::validation;

/// GET /api/v1/users - Lister les comptes (ADMIN)
#[get("")]
pub async fn list_users(
    auth_user: AuthUser,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::UserCollection, Verb::Read)?;

    let mut finder = users::Entity::find().order_by_asc(users::Column::Username);
    if let Some(search) = &query.search {
        finder = finder.filter(users::Column::Username.contains(search));
    }

    let rows = finder
        .limit(query.limit())
        .offset(query.offset())
        .all(db)
        .await?;

    let response: Vec<UserResponse> = rows.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/users - Créer un compte (ADMIN, rôle librement choisi)
#[post("")]
pub async fn create_user(
    auth_user: AuthUser,
    body: web::Json<CreateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::UserCollection, Verb::Create)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let created = UserService::create_user(db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(created)))
}

/// GET /api/v1/users/me - Son propre profil (AUTHENTIFIÉ)
#[get("/me")]
pub async fn get_me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let principal = AuthService::principal(db.get_ref(), &auth_user).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(principal)))
}

/// PATCH /api/v1/users/me - Modifier son profil (AUTHENTIFIÉ)
/// Un champ role soumis par un non-admin est écarté sans erreur.
#[patch("/me")]
pub async fn update_me(
    auth_user: AuthUser,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let principal = AuthService::principal(db, &auth_user).await?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    if let Some(username) = &body.username {
        validation::validate_username(username)?;
    }

    let allow_role_change = principal.is_admin();
    let account = UserService::apply_update(principal, body.into_inner(), allow_role_change);
    let updated = UserService::persist_update(db, account).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// GET /api/v1/users/{username} - Profil d'un compte (ADMIN ou SOI-MÊME)
#[get("/{username}")]
pub async fn get_user(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let username = path.into_inner();

    // Le propriétaire passe, sinon contrôle admin AVANT la résolution
    let principal = AuthService::principal(db, &auth_user).await?;
    if principal.username != username {
        check_route(Some(&principal), ResourceClass::UserCollection, Verb::Read)?;
    }

    let user = resolver_service::find_user_by_username(db, &username).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PATCH /api/v1/users/{username} - Modifier un compte (ADMIN, rôle compris)
#[patch("/{username}")]
pub async fn update_user(
    auth_user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::UserCollection, Verb::Update)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    if let Some(username) = &body.username {
        validation::validate_username(username)?;
    }

    let target = resolver_service::find_user_by_username(db, &path.into_inner()).await?;
    let account = UserService::apply_update(target, body.into_inner(), true);
    let updated = UserService::persist_update(db, account).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

/// DELETE /api/v1/users/{username} - Supprimer un compte (ADMIN)
/// Ses avis et commentaires suivent en cascade.
#[delete("/{username}")]
pub async fn delete_user(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::UserCollection, Verb::Delete)?;

    let target = resolver_service::find_user_by_username(db, &path.into_inner()).await?;
    target.delete(db).await?;

    Ok(HttpResponse::NoContent().finish())
}

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    // "/me" est enregistré avant "/{username}" pour capter la route littérale
    cfg.service(
        web::scope("/users")
            .service(list_users)
            .service(create_user)
            .service(get_me)
            .service(update_me)
            .service(get_user)
            .service(update_user)
            .service(delete_user),
    );
}
