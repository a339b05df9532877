// Même surface que les catégories: liste publique, création et suppression
// réservées aux admins, recherche sur le nom.

use actix_web::{delete, get, post, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateGenreRequest, GenreResponse, PageQuery};
use crate::models::genres;
use crate::services::auth_service::AuthService;
use crate::services::permission_service::{check_route, ResourceClass, Verb};
use crate::utils::validation;

/// GET /api/v1/genres - Lister les genres (PUBLIC)
#[get("")]
pub async fn list_genres(
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut finder = genres::Entity::find().order_by_asc(genres::Column::Name);

    if let Some(search) = &query.search {
        finder = finder.filter(genres::Column::Name.contains(search));
    }

    let rows = finder
        .limit(query.limit())
        .offset(query.offset())
        .all(db.get_ref())
        .await?;

    let response: Vec<GenreResponse> = rows.into_iter().map(GenreResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/genres - Créer un genre (ADMIN)
#[post("")]
pub async fn create_genre(
    auth_user: AuthUser,
    body: web::Json<CreateGenreRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let principal = AuthService::principal(db.get_ref(), &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Create)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validation::validate_slug(&body.slug)?;

    let taken = genres::Entity::find()
        .filter(genres::Column::Slug.eq(&body.slug))
        .one(db.get_ref())
        .await?
        .is_some();
    if taken {
        return Err(ApiError::Validation(format!(
            "Slug '{}' already exists",
            body.slug
        )));
    }

    let body = body.into_inner();
    let new_genre = genres::ActiveModel {
        name: Set(body.name),
        slug: Set(body.slug),
        ..Default::default()
    };

    let created = match new_genre.insert(db.get_ref()).await {
        Ok(model) => model,
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                return Err(ApiError::Validation("Slug already exists".to_string()));
            }
            _ => return Err(err.into()),
        },
    };

    Ok(HttpResponse::Created().json(GenreResponse::from(created)))
}

/// DELETE /api/v1/genres/{slug} - Supprimer un genre (ADMIN)
#[delete("/{slug}")]
pub async fn delete_genre(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let principal = AuthService::principal(db.get_ref(), &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Delete)?;

    let slug = path.into_inner();
    let genre = genres::Entity::find()
        .filter(genres::Column::Slug.eq(&slug))
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Genre '{}' not found", slug)))?;

    genre.delete(db.get_ref()).await?;

    Ok(HttpResponse::NoContent().finish())
}

pub fn genre_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/genres")
            .service(list_genres)
            .service(create_genre)
            .service(delete_genre),
    );
}
