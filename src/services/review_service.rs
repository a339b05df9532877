// ============================================================================
// SERVICE : AVIS
// ============================================================================
//
// Porte l'invariant "un seul avis par (auteur, oeuvre)".
//
// Le pré-contrôle (SELECT avant INSERT) ne sert qu'à produire un message
// propre sans tentative d'insertion. La source de vérité reste la contrainte
// UNIQUE (author_id, title_id) de la table reviews: deux soumissions
// concurrentes du même auteur se départagent en base, et la perdante remonte
// avec le MÊME rejet 400, jamais une erreur brute de stockage.
//
// ============================================================================

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::errors::ApiError;
use crate::models::dto::CreateReviewRequest;
use crate::models::{reviews, users};

pub struct ReviewService;

impl ReviewService {
    /// Crée un avis pour l'auteur donné sur l'oeuvre donnée.
    /// Rejette en Validation si l'auteur a déjà noté cette oeuvre.
    pub async fn create_review(
        db: &DatabaseConnection,
        author: &users::Model,
        title_id: i32,
        request: CreateReviewRequest,
    ) -> Result<reviews::Model, ApiError> {
        // 1. Pré-contrôle pour un message propre
        let existing = reviews::Entity::find()
            .filter(reviews::Column::AuthorId.eq(author.id))
            .filter(reviews::Column::TitleId.eq(title_id))
            .one(db)
            .await?;

        if existing.is_some() {
            return Err(Self::duplicate_review());
        }

        // 2. Insertion; la contrainte UNIQUE tranche les courses
        let new_review = reviews::ActiveModel {
            text: Set(request.text),
            score: Set(request.score),
            author_id: Set(author.id),
            title_id: Set(title_id),
            pub_date: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        match new_review.insert(db).await {
            Ok(model) => Ok(model),
            Err(err) => match err.sql_err() {
                // La course perdue donne le même rejet que le pré-contrôle
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(Self::duplicate_review()),
                _ => Err(err.into()),
            },
        }
    }

    fn duplicate_review() -> ApiError {
        ApiError::Validation("You have already reviewed this title".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn author() -> users::Model {
        users::Model {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: None,
            last_name: None,
            bio: None,
            role: UserRole::User,
            is_superuser: false,
            confirmation_code: None,
        }
    }

    fn review(id: i32, author_id: i32, title_id: i32) -> reviews::Model {
        reviews::Model {
            id,
            text: "Très bon".to_string(),
            score: 8,
            author_id,
            title_id,
            pub_date: Utc::now().fixed_offset(),
        }
    }

    fn request(score: i16) -> CreateReviewRequest {
        CreateReviewRequest {
            text: "Très bon".to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_create_review_happy_path() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // Pré-contrôle: aucun avis existant
            .append_query_results([Vec::<reviews::Model>::new()])
            // INSERT ... RETURNING
            .append_query_results([vec![review(1, 7, 3)]])
            .into_connection();

        let created = ReviewService::create_review(&db, &author(), 3, request(8))
            .await
            .unwrap();
        assert_eq!(created.author_id, 7);
        assert_eq!(created.title_id, 3);
    }

    #[tokio::test]
    async fn test_second_review_is_rejected_before_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // Pré-contrôle: un avis existe déjà pour (auteur, oeuvre)
            .append_query_results([vec![review(1, 7, 3)]])
            .into_connection();

        let result = ReviewService::create_review(&db, &author(), 3, request(5)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        // Aucune insertion ne doit avoir été tentée
        let log: Vec<Transaction> = db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }
}
