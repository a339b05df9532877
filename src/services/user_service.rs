// Gestion des comptes: création côté admin et mises à jour de profil.
// La règle sensible vit dans apply_update: un non-admin qui soumet un champ
// `role` sur son propre profil ne déclenche PAS d'erreur, le champ est
// simplement ignoré et le rôle stocké reste inchangé.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::errors::ApiError;
use crate::models::dto::{CreateUserRequest, UpdateUserRequest};
use crate::models::users::{self, UserRole};
use crate::utils::validation;

pub struct UserService;

impl UserService {
    /// Création d'un compte par un admin (rôle librement choisi)
    pub async fn create_user(
        db: &DatabaseConnection,
        request: CreateUserRequest,
    ) -> Result<users::Model, ApiError> {
        validation::validate_username(&request.username)?;

        // 1. Unicité du username et de l'email
        let username_taken = users::Entity::find()
            .filter(users::Column::Username.eq(&request.username))
            .one(db)
            .await?
            .is_some();
        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(&request.email))
            .one(db)
            .await?
            .is_some();

        if username_taken || email_taken {
            return Err(Self::account_exists());
        }

        // 2. Insertion; la contrainte UNIQUE tranche les courses
        let account = users::ActiveModel {
            username: Set(request.username),
            email: Set(request.email),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            bio: Set(request.bio),
            role: Set(request.role.unwrap_or(UserRole::User)),
            is_superuser: Set(false),
            confirmation_code: Set(None),
            ..Default::default()
        };

        match account.insert(db).await {
            Ok(model) => Ok(model),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(Self::account_exists()),
                _ => Err(err.into()),
            },
        }
    }

    /// Applique une mise à jour partielle de profil.
    /// `allow_role_change` est faux pour un non-admin sur /users/me:
    /// le champ role soumis est alors écarté sans erreur.
    pub fn apply_update(
        user: users::Model,
        request: UpdateUserRequest,
        allow_role_change: bool,
    ) -> users::ActiveModel {
        let mut account: users::ActiveModel = user.into();

        if let Some(username) = request.username {
            account.username = Set(username);
        }
        if let Some(email) = request.email {
            account.email = Set(email);
        }
        if let Some(first_name) = request.first_name {
            account.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = request.last_name {
            account.last_name = Set(Some(last_name));
        }
        if let Some(bio) = request.bio {
            account.bio = Set(Some(bio));
        }
        match request.role {
            Some(role) if allow_role_change => account.role = Set(role),
            _ => {} // champ gelé: on garde le rôle stocké
        }

        account
    }

    /// Persiste une mise à jour en traduisant la violation d'unicité
    /// (changement de username/email vers une valeur déjà prise)
    pub async fn persist_update(
        db: &DatabaseConnection,
        account: users::ActiveModel,
    ) -> Result<users::Model, ApiError> {
        match account.update(db).await {
            Ok(model) => Ok(model),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(Self::account_exists()),
                _ => Err(err.into()),
            },
        }
    }

    fn account_exists() -> ApiError {
        ApiError::Validation("Username or email already exists".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> users::Model {
        users::Model {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            first_name: None,
            last_name: None,
            bio: None,
            role,
            is_superuser: false,
            confirmation_code: None,
        }
    }

    fn update_with_role(role: UserRole) -> UpdateUserRequest {
        UpdateUserRequest {
            username: None,
            email: None,
            first_name: Some("Alice".to_string()),
            last_name: None,
            bio: None,
            role: Some(role),
        }
    }

    #[test]
    fn test_role_field_is_frozen_for_non_admin() {
        let account = UserService::apply_update(
            user(UserRole::User),
            update_with_role(UserRole::Admin),
            false,
        );

        // Le champ role n'est pas touché, les autres champs passent
        assert!(!account.role.is_set());
        assert!(account.first_name.is_set());
    }

    #[test]
    fn test_role_field_applies_for_admin() {
        let account = UserService::apply_update(
            user(UserRole::User),
            update_with_role(UserRole::Moderator),
            true,
        );

        assert!(account.role.is_set());
        assert_eq!(account.role.clone().unwrap(), UserRole::Moderator);
    }

    #[test]
    fn test_partial_update_leaves_missing_fields_alone() {
        let request = UpdateUserRequest {
            username: None,
            email: None,
            first_name: None,
            last_name: None,
            bio: Some("bonjour".to_string()),
            role: None,
        };

        let account = UserService::apply_update(user(UserRole::User), request, true);
        assert!(account.bio.is_set());
        assert!(!account.username.is_set());
        assert!(!account.email.is_set());
        assert!(!account.role.is_set());
    }
}
