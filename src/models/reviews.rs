// ============================================================================
// MODÈLE : REVIEWS
// ============================================================================
//
// Description:
//   Avis d'un utilisateur sur une oeuvre, avec une note entière de 1 à 10.
//
// Colonnes de la table reviews:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - text (TEXT, NOT NULL)
//   - score (SMALLINT, NOT NULL) - borné [1,10] à la validation
//   - author_id (INTEGER, NOT NULL, FK vers users, ON DELETE CASCADE)
//   - title_id (INTEGER, NOT NULL, FK vers titles, ON DELETE CASCADE)
//   - pub_date (TIMESTAMPTZ, NOT NULL, DEFAULT CURRENT_TIMESTAMP)
//
// Contraintes:
//   - UNIQUE (author_id, title_id) : un seul avis par auteur et par oeuvre.
//     La contrainte en base est la source de vérité; le pré-contrôle de
//     review_service ne sert qu'à produire un message propre. Une course
//     entre deux insertions concurrentes remonte comme la même erreur 400.
//
// Ordre par défaut: pub_date DESC (le plus récent d'abord).
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub text: String,
    pub score: i16,
    pub author_id: i32,
    pub title_id: i32,
    pub pub_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Author,

    #[sea_orm(
        belongs_to = "super::titles::Entity",
        from = "Column::TitleId",
        to = "super::titles::Column::Id"
    )]
    Title,

    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::titles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Title.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
