// ============================================================================
// SERVICE : NOTE AGRÉGÉE
// ============================================================================
//
// La note d'une oeuvre est la moyenne arrondie des scores de ses avis,
// recalculée à CHAQUE lecture (jamais persistée, jamais de cache).
// Une seule requête d'agrégat (AVG + GROUP BY) couvre la liste comme le
// détail: pas de chargement des lignes d'avis en mémoire.
// Zéro avis => pas de ligne dans le résultat => note absente (null en JSON).
//
// ============================================================================

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QuerySelect,
};

use crate::errors::ApiError;
use crate::models::reviews;

#[derive(Debug, FromQueryResult)]
struct TitleRating {
    title_id: i32,
    rating: Option<Decimal>,
}

/// Moyennes arrondies pour un lot d'oeuvres, en une requête.
/// Les oeuvres sans avis sont absentes de la map.
pub async fn ratings_for(
    db: &DatabaseConnection,
    title_ids: &[i32],
) -> Result<HashMap<i32, i32>, ApiError> {
    if title_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = reviews::Entity::find()
        .select_only()
        .column(reviews::Column::TitleId)
        .column_as(
            SimpleExpr::from(Func::avg(Expr::col(reviews::Column::Score))),
            "rating",
        )
        .filter(reviews::Column::TitleId.is_in(title_ids.to_vec()))
        .group_by(reviews::Column::TitleId)
        .into_model::<TitleRating>()
        .all(db)
        .await?;

    let mut ratings = HashMap::new();
    for row in rows {
        if let Some(rounded) = row.rating.and_then(round_rating) {
            ratings.insert(row.title_id, rounded);
        }
    }
    Ok(ratings)
}

/// Moyenne arrondie pour une seule oeuvre, None si elle n'a aucun avis
pub async fn rating_for(
    db: &DatabaseConnection,
    title_id: i32,
) -> Result<Option<i32>, ApiError> {
    let ratings = ratings_for(db, &[title_id]).await?;
    Ok(ratings.get(&title_id).copied())
}

/// Arrondi à l'entier le plus proche, demi-points vers l'extérieur
fn round_rating(avg: Decimal) -> Option<i32> {
    avg.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn rating_row(title_id: i32, rating: Decimal) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("title_id", Value::from(title_id)),
            ("rating", Value::from(rating)),
        ])
    }

    #[test]
    fn test_round_rating() {
        // Moyenne de {1, 3, 5} = 3
        assert_eq!(round_rating(Decimal::new(3, 0)), Some(3));
        assert_eq!(round_rating(Decimal::new(74, 1)), Some(7)); // 7.4
        assert_eq!(round_rating(Decimal::new(75, 1)), Some(8)); // 7.5
        assert_eq!(round_rating(Decimal::new(1, 0)), Some(1));
        assert_eq!(round_rating(Decimal::new(10, 0)), Some(10));
    }

    #[tokio::test]
    async fn test_ratings_for_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                rating_row(1, Decimal::new(3, 0)),
                rating_row(2, Decimal::new(85, 1)),
            ]])
            .into_connection();

        let ratings = ratings_for(&db, &[1, 2, 3]).await.unwrap();
        assert_eq!(ratings.get(&1), Some(&3));
        assert_eq!(ratings.get(&2), Some(&9)); // 8.5 arrondi à 9
        // Le titre 3 n'a aucun avis: absent de la map
        assert_eq!(ratings.get(&3), None);
    }

    #[tokio::test]
    async fn test_ratings_for_empty_input_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let ratings = ratings_for(&db, &[]).await.unwrap();
        assert!(ratings.is_empty());
    }

    #[tokio::test]
    async fn test_rating_for_title_without_reviews() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&'static str, Value>>::new()])
            .into_connection();

        let rating = rating_for(&db, 42).await.unwrap();
        assert_eq!(rating, None);
    }
}
