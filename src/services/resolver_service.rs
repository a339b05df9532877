// ============================================================================
// SERVICE : RÉSOLUTION DES RESSOURCES IMBRIQUÉES
// ============================================================================
//
// Transforme les paramètres de chemin en entités concrètes, ou en NotFound.
// La chaîne titre -> avis -> commentaire est TOUJOURS résolue avec les deux
// filtres composés: un avis n'est jamais cherché par id seul quand le chemin
// porte un title_id. Un commentaire ne peut donc pas être rattaché à un avis
// qui n'appartient pas au titre du chemin.
//
// ============================================================================

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::errors::ApiError;
use crate::models::{comments, reviews, titles, users};

/// Résout une oeuvre par id
pub async fn find_title(db: &DatabaseConnection, title_id: i32) -> Result<titles::Model, ApiError> {
    titles::Entity::find_by_id(title_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Title {} not found", title_id)))
}

/// Résout un avis DANS une oeuvre: les deux filtres sont composés.
/// Un avis existant mais rattaché à une autre oeuvre donne NotFound.
pub async fn find_review(
    db: &DatabaseConnection,
    title_id: i32,
    review_id: i32,
) -> Result<reviews::Model, ApiError> {
    reviews::Entity::find()
        .filter(reviews::Column::Id.eq(review_id))
        .filter(reviews::Column::TitleId.eq(title_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Review {} not found for title {}",
                review_id, title_id
            ))
        })
}

/// Résout un commentaire DANS un avis (lui-même résolu dans son oeuvre)
pub async fn find_comment(
    db: &DatabaseConnection,
    review_id: i32,
    comment_id: i32,
) -> Result<comments::Model, ApiError> {
    comments::Entity::find()
        .filter(comments::Column::Id.eq(comment_id))
        .filter(comments::Column::ReviewId.eq(review_id))
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Comment {} not found for review {}",
                comment_id, review_id
            ))
        })
}

/// Résout un utilisateur par username (surface d'administration)
pub async fn find_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<users::Model, ApiError> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", username)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn review(id: i32, title_id: i32) -> reviews::Model {
        reviews::Model {
            id,
            text: "Superbe".to_string(),
            score: 8,
            author_id: 1,
            title_id,
            pub_date: chrono::Utc::now().fixed_offset(),
        }
    }

    #[tokio::test]
    async fn test_find_title_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<titles::Model>::new()])
            .into_connection();

        let result = find_title(&db, 42).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_review_scoped_to_title() {
        // L'avis 9 existe mais appartient au titre 7: la requête filtrée sur
        // le titre 5 ne renvoie aucune ligne, donc NotFound
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reviews::Model>::new()])
            .into_connection();

        let result = find_review(&db, 5, 9).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_review_found_in_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![review(9, 7)]])
            .into_connection();

        let found = find_review(&db, 7, 9).await.unwrap();
        assert_eq!(found.id, 9);
        assert_eq!(found.title_id, 7);
    }

    #[tokio::test]
    async fn test_find_comment_not_in_review() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comments::Model>::new()])
            .into_connection();

        let result = find_comment(&db, 3, 12).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
