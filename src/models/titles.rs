// ============================================================================
// MODÈLE : TITLES
// ============================================================================
//
// Description:
//   Oeuvre évaluée (livre, film, etc.). Pas de propriétaire direct:
//   la mutation est réservée aux admins (voir permission_service).
//
// Colonnes de la table titles:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - name (VARCHAR(256), NOT NULL)
//   - year (SMALLINT, NOT NULL) - validé <= année courante à l'écriture
//   - description (TEXT, NULL)
//   - category_id (INTEGER, NOT NULL, FK vers categories, ON DELETE CASCADE)
//
// Relations:
//   - belongs_to categories (exactement une catégorie)
//   - many-to-many genres via title_genres (ensemble non vide, validé à l'écriture)
//   - has_many reviews (ON DELETE CASCADE: supprimer un titre supprime ses
//     avis, et la cascade reviews -> comments supprime leurs commentaires)
//
// Points d'attention:
//   - La note agrégée (rating) n'est PAS une colonne: elle est recalculée à
//     chaque lecture par rating_service (AVG sur reviews.score).
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "titles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub year: i16,
    pub description: Option<String>,
    pub category_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,

    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,

    #[sea_orm(has_many = "super::title_genres::Entity")]
    TitleGenres,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::title_genres::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleGenres.def()
    }
}

// Many-to-many vers les genres via la table de jointure
impl Related<super::genres::Entity> for Entity {
    fn to() -> RelationDef {
        super::title_genres::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::title_genres::Relation::Title.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
