use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{CommentResponse, CreateCommentRequest, PageQuery};
use crate::models::{comments, users};
use crate::services::auth_service::AuthService;
use crate::services::permission_service::{check_object, check_route, ResourceClass, Verb};
use crate::services::resolver_service;

/// GET .../reviews/{review_id}/comments - Commentaires d'un avis (PUBLIC)
/// Le plus ancien d'abord. L'avis est résolu DANS l'oeuvre du chemin:
/// un avis rattaché à une autre oeuvre donne 404.
#[get("")]
pub async fn list_comments(
    path: web::Path<(i32, i32)>,
    query: web::Query<PageQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id) = path.into_inner();

    let review = resolver_service::find_review(db, title_id, review_id).await?;

    let rows = comments::Entity::find()
        .filter(comments::Column::ReviewId.eq(review.id))
        .order_by_asc(comments::Column::PubDate)
        .limit(query.limit())
        .offset(query.offset())
        .all(db)
        .await?;

    let response = to_responses(db, rows).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST .../reviews/{review_id}/comments - Commenter un avis (AUTHENTIFIÉ)
#[post("")]
pub async fn create_comment(
    auth_user: AuthUser,
    path: web::Path<(i32, i32)>,
    body: web::Json<CreateCommentRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id) = path.into_inner();

    // 1. Contrôle de route avant la résolution de la chaîne oeuvre -> avis
    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Comment, Verb::Create)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let review = resolver_service::find_review(db, title_id, review_id).await?;

    let new_comment = comments::ActiveModel {
        text: Set(body.into_inner().text),
        author_id: Set(principal.id),
        review_id: Set(review.id),
        pub_date: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    let comment = new_comment.insert(db).await?;

    Ok(HttpResponse::Created().json(CommentResponse {
        id: comment.id,
        author: principal.username,
        text: comment.text,
        pub_date: comment.pub_date,
    }))
}

/// GET .../comments/{comment_id} - Détail d'un commentaire (PUBLIC)
#[get("/{comment_id}")]
pub async fn get_comment(
    path: web::Path<(i32, i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id, comment_id) = path.into_inner();

    let review = resolver_service::find_review(db, title_id, review_id).await?;
    let comment = resolver_service::find_comment(db, review.id, comment_id).await?;
    let author = author_username(db, &comment).await?;

    Ok(HttpResponse::Ok().json(CommentResponse {
        id: comment.id,
        author,
        text: comment.text,
        pub_date: comment.pub_date,
    }))
}

/// PATCH .../comments/{comment_id} - Modifier un commentaire
/// (AUTEUR, MODÉRATEUR ou ADMIN)
#[patch("/{comment_id}")]
pub async fn update_comment(
    auth_user: AuthUser,
    path: web::Path<(i32, i32, i32)>,
    body: web::Json<CreateCommentRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id, comment_id) = path.into_inner();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Comment, Verb::Update)?;

    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let review = resolver_service::find_review(db, title_id, review_id).await?;
    let comment = resolver_service::find_comment(db, review.id, comment_id).await?;
    check_object(&principal, comment.author_id)?;

    let mut active: comments::ActiveModel = comment.into();
    active.text = Set(body.into_inner().text);
    let updated = active.update(db).await?;
    let author = author_username(db, &updated).await?;

    Ok(HttpResponse::Ok().json(CommentResponse {
        id: updated.id,
        author,
        text: updated.text,
        pub_date: updated.pub_date,
    }))
}

/// DELETE .../comments/{comment_id} - Supprimer un commentaire
/// (AUTEUR, MODÉRATEUR ou ADMIN)
#[delete("/{comment_id}")]
pub async fn delete_comment(
    auth_user: AuthUser,
    path: web::Path<(i32, i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let db = db.get_ref();
    let (title_id, review_id, comment_id) = path.into_inner();

    let principal = AuthService::principal(db, &auth_user).await?;
    check_route(Some(&principal), ResourceClass::Comment, Verb::Delete)?;

    let review = resolver_service::find_review(db, title_id, review_id).await?;
    let comment = resolver_service::find_comment(db, review.id, comment_id).await?;
    check_object(&principal, comment.author_id)?;

    comment.delete(db).await?;

    Ok(HttpResponse::NoContent().finish())
}

// ── Aides locales ───────────────────────────────────────────────────────────

async fn to_responses(
    db: &DatabaseConnection,
    rows: Vec<comments::Model>,
) -> Result<Vec<CommentResponse>, ApiError> {
    let authors = rows.load_one(users::Entity, db).await?;

    let mut response = Vec::with_capacity(rows.len());
    for (comment, author) in rows.into_iter().zip(authors.into_iter()) {
        let author =
            author.ok_or_else(|| ApiError::Internal("comment without author".to_string()))?;
        response.push(CommentResponse {
            id: comment.id,
            author: author.username,
            text: comment.text,
            pub_date: comment.pub_date,
        });
    }
    Ok(response)
}

async fn author_username(
    db: &DatabaseConnection,
    comment: &comments::Model,
) -> Result<String, ApiError> {
    users::Entity::find_by_id(comment.author_id)
        .one(db)
        .await?
        .map(|user| user.username)
        .ok_or_else(|| ApiError::Internal("comment without author".to_string()))
}

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/titles/{title_id}/reviews/{review_id}/comments")
            .service(list_comments)
            .service(create_comment)
            .service(get_comment)
            .service(update_comment)
            .service(delete_comment),
    );
}
