use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rôle d'un utilisateur authentifié.
/// L'ordre des variantes donne l'ordre de comparaison: User < Moderator < Admin.
/// Le principal anonyme n'a pas de rôle: il est représenté par Option<Model>.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
    pub is_superuser: bool,
    #[serde(skip_serializing)] // Ne jamais exposer le code en JSON
    pub confirmation_code: Option<String>,
}

impl Model {
    /// Un superuser est toujours admin, quel que soit son rôle stocké
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin || self.is_superuser
    }

    pub fn is_moderator_or_above(&self) -> bool {
        self.role >= UserRole::Moderator || self.is_superuser
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,

    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, is_superuser: bool) -> Model {
        Model {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: None,
            last_name: None,
            bio: None,
            role,
            is_superuser,
            confirmation_code: None,
        }
    }

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::User < UserRole::Moderator);
        assert!(UserRole::Moderator < UserRole::Admin);
    }

    #[test]
    fn test_is_admin() {
        assert!(user(UserRole::Admin, false).is_admin());
        assert!(!user(UserRole::Moderator, false).is_admin());
        assert!(!user(UserRole::User, false).is_admin());
    }

    #[test]
    fn test_superuser_is_always_admin() {
        assert!(user(UserRole::User, true).is_admin());
        assert!(user(UserRole::User, true).is_moderator_or_above());
    }

    #[test]
    fn test_is_moderator_or_above() {
        assert!(user(UserRole::Moderator, false).is_moderator_or_above());
        assert!(user(UserRole::Admin, false).is_moderator_or_above());
        assert!(!user(UserRole::User, false).is_moderator_or_above());
    }
}
