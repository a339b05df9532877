// Structures de requête et de réponse de l'API.
// Les DTO d'authentification restent dans routes/auth.rs.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::users::UserRole;
use crate::models::{categories, genres, users};

// ── Pagination ──────────────────────────────────────────────────────────────

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub search: Option<String>,
}

impl PageQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

// ── Catégories / genres ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub name: String,
    pub slug: String,
}

impl From<categories::Model> for CategoryResponse {
    fn from(model: categories::Model) -> Self {
        CategoryResponse {
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenreResponse {
    pub name: String,
    pub slug: String,
}

impl From<genres::Model> for GenreResponse {
    fn from(model: genres::Model) -> Self {
        GenreResponse {
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub slug: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGenreRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub slug: String,
}

// ── Titres ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub id: i32,
    pub name: String,
    pub year: i16,
    /// Moyenne arrondie des notes, null si le titre n'a aucun avis
    pub rating: Option<i32>,
    pub description: Option<String>,
    pub genre: Vec<GenreResponse>,
    pub category: CategoryResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    pub year: i16,
    pub description: Option<String>,
    /// Slug de la catégorie
    pub category: String,
    /// Slugs des genres, au moins un
    #[validate(length(min = 1))]
    pub genre: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    pub year: Option<i16>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
}

// ── Avis / commentaires ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i32,
    /// Username de l'auteur
    pub author: String,
    pub text: String,
    pub score: i16,
    pub pub_date: DateTime<FixedOffset>,
    pub title: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(range(min = 1, max = 10))]
    pub score: i16,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub score: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i32,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1))]
    pub text: String,
}

// ── Utilisateurs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
}

impl From<users::Model> for UserResponse {
    fn from(model: users::Model) -> Self {
        UserResponse {
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            bio: model.bio,
            role: model.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(email, length(max = 254))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Ignoré silencieusement sur /users/me pour un non-admin
    pub role: Option<UserRole>,
}
