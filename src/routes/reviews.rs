use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{CreateReviewRequest, PageQuery, ReviewResponse, UpdateReviewRequest};
use crate::models::{reviews, users};
use crate::services::auth_service::AuthService;
use crate::services::permission_service::{check_object, check_route, ResourceClass, Verb};
use crate::services::resolver_service;
use crate::services::review_service::ReviewService;

/// GET /api/v1/titles/{title_id}/reviews - Avis d'une oeuvre (PUBLIC)
/// Le plus récent d'abord. 404 si l'oeuvre n'existe pas.
#[get("")]
pub async fn list_reviews(
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let title = resolver_service::find_title(db, path.into_inner()).await?;

    let rows = reviews::Entity::find()
        .filter(reviews::Column::TitleId.eq(title.id))
        .order_by_desc(reviews::Column::PubDate)
        .limit(query.limit())
        .offset(query.offset())
        .all(db)
        .await?;

    let response = to_responses(db, rows).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/titles/{title_id}/reviews - Déposer un avis (AUTHENTIFIÉ)
/// Un seul avis par auteur et par oeuvre.
#[post("")]
pub async fn create_review(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CreateReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();

    // 1. Contrôle de route avant la résolution de l'oeuvre
    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Review, Verb::Create)?;

    // 2. Validation du payload
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    // 3. Résolution puis garde d'unicité
    let title = resolver_service::find_title(db, path.into_inner()).await?;
    let review = ReviewService::create_review(db, &principal, title.id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(ReviewResponse {
        id: review.id,
        author: principal.username,
        text: review.text,
        score: review.score,
        pub_date: review.pub_date,
        title: review.title_id,
    }))
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id} - Détail d'un avis (PUBLIC)
#[get("/{review_id}")]
pub async fn get_review(
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id) = path.into_inner();

    let review = resolver_service::find_review(db, title_id, review_id).await?;
    let author = author_username(db, &review).await?;

    Ok(HttpResponse::Ok().json(ReviewResponse {
        id: review.id,
        author,
        text: review.text,
        score: review.score,
        pub_date: review.pub_date,
        title: review.title_id,
    }))
}

/// PATCH /api/v1/titles/{title_id}/reviews/{review_id} - Modifier un avis
/// (AUTEUR, MODÉRATEUR ou ADMIN)
#[patch("/{review_id}")]
pub async fn update_review(
    auth_user: AuthUser,
    path: web::Path<(i32, i32)>,
    body: web::Json<UpdateReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id) = path.into_inner();

    // 1. Route, puis résolution, puis objet
    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Review, Verb::Update)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let review = resolver_service::find_review(db, title_id, review_id).await?;
    check_object(&principal, review.author_id)?;

    let body = body.into_inner();
    let mut active: reviews::ActiveModel = review.into();
    if let Some(text) = body.text {
        active.text = Set(text);
    }
    if let Some(score) = body.score {
        active.score = Set(score);
    }
    let updated = active.update(db).await?;
    let author = author_username(db, &updated).await?;

    Ok(HttpResponse::Ok().json(ReviewResponse {
        id: updated.id,
        author,
        text: updated.text,
        score: updated.score,
        pub_date: updated.pub_date,
        title: updated.title_id,
    }))
}

/// DELETE /api/v1/titles/{title_id}/reviews/{review_id} - Supprimer un avis
/// (AUTEUR, MODÉRATEUR ou ADMIN). Les commentaires suivent en cascade.
#[delete("/{review_id}")]
pub async fn delete_review(
    auth_user: AuthUser,
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id) = path.into_inner();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Review, Verb::Delete)?;

    let review = resolver_service::find_review(db, title_id, review_id).await?;
    check_object(&principal, review.author_id)?;

    review.delete(db).await?;

    Ok(HttpResponse::NoContent().finish())
}

// ── Aides locales ───────────────────────────────────────────────────────────

async fn to_responses(
    db: &DatabaseConnection,
    rows: Vec<reviews::Model>,
) -> Result<Vec<ReviewResponse>, ApiError> {
    // Un seul chargement groupé des auteurs
    let authors = rows.load_one(users::Entity, db).await?;

    let mut response = Vec::with_capacity(rows.len());
    for (review, author) in rows.into_iter().zip(authors.into_iter()) {
        let author =
            author.ok_or_else(|| ApiError::Internal("review without author".to_string()))?;
        response.push(ReviewResponse {
            id: review.id,
            author: author.username,
            text: review.text,
            score: review.score,
            pub_date: review.pub_date,
            title: review.title_id,
        });
    }
    Ok(response)
}

async fn author_username(
    db: &DatabaseConnection,
    review: &reviews::Model,
) -> Result<String, ApiError> {
    users::Entity::find_by_id(review.author_id)
        .one(db)
        .await?
        .map(|user| user.username)
        .ok_or_else(|| ApiError::Internal("review without author".to_string()))
}

pub fn review_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/titles/{title_id}/reviews")
            .service(list_reviews)
            .service(create_review)
            .service(get_review)
            .service(update_review)
            .service(delete_review),
    );
}
