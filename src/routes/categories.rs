use actix_web::{delete, get, post, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::categories;
use crate::models::dto::{CategoryResponse, CreateCategoryRequest, PageQuery};
use crate::services::auth_service::AuthService;
use crate::services::permission_service::{check_route, ResourceClass, Verb};
use crate::utils::validation;

/// GET /api/v1/categories - Lister les catégories (PUBLIC)
#[get("")]
pub async fn list_categories(
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut finder = categories::Entity::find().order_by_asc(categories::Column::Name);

    if let Some(search) = &query.search {
        finder = finder.filter(categories::Column::Name.contains(search));
    }

    let rows = finder
        .limit(query.limit())
        .offset(query.offset())
        .all(db.get_ref())
        .await?;

    let response: Vec<CategoryResponse> = rows.into_iter().map(CategoryResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/categories - Créer une catégorie (ADMIN)
#[post("")]
pub async fn create_category(
    auth_user: AuthUser,
    body: web::Json<CreateCategoryRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    // 1. Contrôle de route avant toute résolution
    let principal = AuthService::principal(db.get_ref(), &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Create)?;

    // 2. Validation du payload
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validation::validate_slug(&body.slug)?;

    // 3. Unicité du slug
    let taken = categories::Entity::find()
        .filter(categories::Column::Slug.eq(&body.slug))
        .one(db.get_ref())
        .await?
        .is_some();
    if taken {
        return Err(slug_taken(&body.slug));
    }

    let body = body.into_inner();
    let new_category = categories::ActiveModel {
        name: Set(body.name),
        slug: Set(body.slug),
        ..Default::default()
    };

    let created = match new_category.insert(db.get_ref()).await {
        Ok(model) => model,
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                return Err(ApiError::Validation("Slug already exists".to_string()));
            }
            _ => return Err(err.into()),
        },
    };

    Ok(HttpResponse::Created().json(CategoryResponse::from(created)))
}

/// DELETE /api/v1/categories/{slug} - Supprimer une catégorie (ADMIN)
#[delete("/{slug}")]
pub async fn delete_category(
    auth_user: AuthUser,
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let principal = AuthService::principal(db.get_ref(), &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Delete)?;

    let slug = path.into_inner();
    let category = categories::Entity::find()
        .filter(categories::Column::Slug.eq(&slug))
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", slug)))?;

    category.delete(db.get_ref()).await?;

    Ok(HttpResponse::NoContent().finish())
}

fn slug_taken(slug: &str) -> ApiError {
    ApiError::Validation(format!("Slug '{}' already exists", slug))
}

pub fn category_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .service(list_categories)
            .service(create_category)
            .service(delete_category),
    );
}
