use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    CategoryResponse, CreateTitleRequest, GenreResponse, TitleResponse, UpdateTitleRequest,
};
use crate::models::{categories, genres, title_genres, titles};
use crate::services::auth_service::AuthService;
use crate::services::permission_service::{check_route, ResourceClass, Verb};
use crate::services::{rating_service, resolver_service};
use crate::utils::validation;

// Filtres de liste (tous optionnels, combinables)
#[derive(Deserialize)]
pub struct TitleQuery {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i16>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// GET /api/v1/titles - Lister les oeuvres avec leur note agrégée (PUBLIC)
#[get("")]
pub async fn list_titles(
    db: web::Data<DatabaseConnection>,
    query: web::Query<TitleQuery>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let mut finder = titles::Entity::find().order_by_asc(titles::Column::Name);

    if let Some(name) = &query.name {
        finder = finder.filter(titles::Column::Name.contains(name));
    }
    if let Some(year) = query.year {
        finder = finder.filter(titles::Column::Year.eq(year));
    }
    if let Some(category_slug) = &query.category {
        match categories::Entity::find()
            .filter(categories::Column::Slug.eq(category_slug))
            .one(db)
            .await?
        {
            Some(category) => {
                finder = finder.filter(titles::Column::CategoryId.eq(category.id));
            }
            // Slug inconnu: liste vide, pas une erreur
            None => return Ok(HttpResponse::Ok().json(Vec::<TitleResponse>::new())),
        }
    }
    if let Some(genre_slug) = &query.genre {
        match genres::Entity::find()
            .filter(genres::Column::Slug.eq(genre_slug))
            .one(db)
            .await?
        {
            Some(genre) => {
                let title_ids: Vec<i32> = title_genres::Entity::find()
                    .filter(title_genres::Column::GenreId.eq(genre.id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.title_id)
                    .collect();
                finder = finder.filter(titles::Column::Id.is_in(title_ids));
            }
            None => return Ok(HttpResponse::Ok().json(Vec::<TitleResponse>::new())),
        }
    }

    let rows = finder
        .limit(query.limit.unwrap_or(20).min(100))
        .offset(query.offset.unwrap_or(0))
        .all(db)
        .await?;

    // Chargements groupés: genres, catégories, puis les notes en un agrégat
    let title_ids: Vec<i32> = rows.iter().map(|t| t.id).collect();
    let genre_sets = rows
        .load_many_to_many(genres::Entity, title_genres::Entity, db)
        .await?;
    let category_rows = rows.load_one(categories::Entity, db).await?;
    let ratings = rating_service::ratings_for(db, &title_ids).await?;

    let mut response = Vec::with_capacity(rows.len());
    for ((title, genre_rows), category) in rows
        .into_iter()
        .zip(genre_sets.into_iter())
        .zip(category_rows.into_iter())
    {
        let category =
            category.ok_or_else(|| ApiError::Internal("title without category".to_string()))?;
        let rating = ratings.get(&title.id).copied();
        response.push(build_response(title, category, genre_rows, rating));
    }

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/titles/{title_id} - Détail d'une oeuvre avec sa note (PUBLIC)
#[get("/{title_id}")]
pub async fn get_title(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let title = resolver_service::find_title(db, path.into_inner()).await?;
    let response = title_detail(db, title).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/titles - Créer une oeuvre (ADMIN)
#[post("")]
pub async fn create_title(
    auth_user: AuthUser,
    body: web::Json<CreateTitleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    // 1. Contrôle de route avant toute résolution
    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Create)?;

    // 2. Validation du payload
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    validation::validate_year(body.year)?;

    let body = body.into_inner();

    // 3. Résoudre la catégorie et les genres par slug
    let category = find_category_by_slug(db, &body.category).await?;
    let genre_rows = find_genres_by_slugs(db, &body.genre).await?;

    // 4. Insertion de l'oeuvre puis des lignes de jointure
    let new_title = titles::ActiveModel {
        name: Set(body.name),
        year: Set(body.year),
        description: Set(body.description),
        category_id: Set(category.id),
        ..Default::default()
    };
    let title = new_title.insert(db).await?;

    let joins: Vec<title_genres::ActiveModel> = genre_rows
        .iter()
        .map(|genre| title_genres::ActiveModel {
            title_id: Set(title.id),
            genre_id: Set(genre.id),
        })
        .collect();
    title_genres::Entity::insert_many(joins).exec(db).await?;

    // Une oeuvre neuve n'a pas d'avis: note absente
    Ok(HttpResponse::Created().json(build_response(title, category, genre_rows, None)))
}

/// PATCH /api/v1/titles/{title_id} - Modifier une oeuvre (ADMIN)
#[patch("/{title_id}")]
pub async fn update_title(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<UpdateTitleRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Update)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let title = resolver_service::find_title(db, path.into_inner()).await?;
    let body = body.into_inner();

    let mut active: titles::ActiveModel = title.into();
    if let Some(name) = body.name {
        active.name = Set(name);
    }
    if let Some(year) = body.year {
        validation::validate_year(year)?;
        active.year = Set(year);
    }
    if let Some(description) = body.description {
        active.description = Set(Some(description));
    }
    if let Some(category_slug) = body.category {
        let category = find_category_by_slug(db, &category_slug).await?;
        active.category_id = Set(category.id);
    }

    let updated = active.update(db).await?;

    // Remplacement complet de l'ensemble des genres s'il est fourni
    if let Some(genre_slugs) = body.genre {
        if genre_slugs.is_empty() {
            return Err(ApiError::Validation(
                "A title requires at least one genre".to_string(),
            ));
        }
        let genre_rows = find_genres_by_slugs(db, &genre_slugs).await?;
        title_genres::Entity::delete_many()
            .filter(title_genres::Column::TitleId.eq(updated.id))
            .exec(db)
            .await?;
        let joins: Vec<title_genres::ActiveModel> = genre_rows
            .iter()
            .map(|genre| title_genres::ActiveModel {
                title_id: Set(updated.id),
                genre_id: Set(genre.id),
            })
            .collect();
        title_genres::Entity::insert_many(joins).exec(db).await?;
    }

    let response = title_detail(db, updated).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /api/v1/titles/{title_id} - Supprimer une oeuvre (ADMIN)
/// La cascade en base emporte ses avis et leurs commentaires.
#[delete("/{title_id}")]
pub async fn delete_title(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Catalog, Verb::Delete)?;

    let title = resolver_service::find_title(db, path.into_inner()).await?;
    title.delete(db).await?;

    Ok(HttpResponse::NoContent().finish())
}

// ── Aides locales ───────────────────────────────────────────────────────────

async fn find_category_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<categories::Model, ApiError> {
    categories::Entity::find()
        .filter(categories::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Validation(format!("Unknown category slug '{}'", slug)))
}

async fn find_genres_by_slugs(
    db: &DatabaseConnection,
    slugs: &[String],
) -> Result<Vec<genres::Model>, ApiError> {
    let rows = genres::Entity::find()
        .filter(genres::Column::Slug.is_in(slugs.to_vec()))
        .all(db)
        .await?;

    let missing: Vec<&String> = slugs
        .iter()
        .filter(|slug| !rows.iter().any(|genre| &genre.slug == *slug))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "Unknown genre slug(s): {:?}",
            missing
        )));
    }

    Ok(rows)
}

/// Assemble la réponse détail: genres, catégorie et note recalculée
async fn title_detail(
    db: &DatabaseConnection,
    title: titles::Model,
) -> Result<TitleResponse, ApiError> {
    let genre_rows = title.find_related(genres::Entity).all(db).await?;
    let category = categories::Entity::find_by_id(title.category_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Internal("title without category".to_string()))?;
    let rating = rating_service::rating_for(db, title.id).await?;

    Ok(build_response(title, category, genre_rows, rating))
}

fn build_response(
    title: titles::Model,
    category: categories::Model,
    genre_rows: Vec<genres::Model>,
    rating: Option<i32>,
) -> TitleResponse {
    TitleResponse {
        id: title.id,
        name: title.name,
        year: title.year,
        rating,
        description: title.description,
        genre: genre_rows.into_iter().map(GenreResponse::from).collect(),
        category: CategoryResponse::from(category),
    }
}

pub fn title_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/titles")
            .service(list_titles)
            .service(create_title)
            .service(get_title)
            .service(update_title)
            .service(delete_title),
    );
}
