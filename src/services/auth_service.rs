// ============================================================================
// SERVICE : AUTHENTIFICATION PAR CODE DE CONFIRMATION
// ============================================================================
//
// Machine à états par username:
//
//   1. POST /auth/signup {email, username}
//      - crée (ou retrouve) le compte, génère un code de confirmation,
//        l'enregistre et l'expédie par email (fire-and-forget)
//      - re-signup avec la MÊME paire (username, email) = renvoi: le code
//        est régénéré, jamais un conflit
//      - username OU email déjà pris par un AUTRE compte = rejet 400
//      - "me" est réservé en permanence
//   2. POST /auth/token {username, confirmation_code}
//      - code correspondant => bearer token JWT
//      - code incorrect => AuthFailed, l'état ne change pas
//
// Le code n'est pas à usage unique: il reste valable jusqu'à sa rotation par
// un nouveau signup. Comparaison simple contre la valeur stockée.
//
// ============================================================================

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::users::{self, UserRole};
use crate::services::email_service;
use crate::utils::{jwt, validation};

pub struct AuthService;

impl AuthService {
    /// Inscription ou renvoi de code. Retourne le compte avec son code frais.
    pub async fn signup(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
    ) -> Result<users::Model, ApiError> {
        validation::validate_username(username)?;

        // 1. Chercher les deux axes d'unicité séparément
        let by_username = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?;
        let by_email = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?;

        let code = Self::generate_code();

        // 2. Créer le compte, ou faire tourner le code du compte existant
        let user = match (by_username, by_email) {
            // Même paire exacte (username, email): renvoi, pas un conflit
            (Some(existing), Some(same)) if existing.id == same.id => {
                let mut account: users::ActiveModel = existing.into();
                account.confirmation_code = Set(Some(code.clone()));
                account.update(db).await?
            }
            (None, None) => {
                let account = users::ActiveModel {
                    username: Set(username.to_string()),
                    email: Set(email.to_string()),
                    role: Set(UserRole::User),
                    is_superuser: Set(false),
                    confirmation_code: Set(Some(code.clone())),
                    ..Default::default()
                };
                account.insert(db).await?
            }
            // Username ou email déjà rattaché à un autre compte
            _ => {
                return Err(ApiError::Validation(
                    "Username or email is already taken by another account".to_string(),
                ));
            }
        };

        // 3. Expédition hors-bande; un échec d'envoi n'annule jamais l'émission
        email_service::dispatch_confirmation_code(
            user.email.clone(),
            user.username.clone(),
            code,
        );

        Ok(user)
    }

    /// Échange (username, code) contre un bearer token
    pub async fn issue_token(
        db: &DatabaseConnection,
        username: &str,
        confirmation_code: &str,
    ) -> Result<String, ApiError> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", username)))?;

        match user.confirmation_code.as_deref() {
            Some(stored) if stored == confirmation_code => {
                jwt::generate_token(user.id, &user.username).map_err(ApiError::Internal)
            }
            _ => Err(ApiError::AuthFailed(
                "Invalid confirmation code".to_string(),
            )),
        }
    }

    /// Recharge le principal depuis la base à partir de l'identité du token.
    /// Le rôle courant fait foi, pas celui qui existait à l'émission du token.
    pub async fn principal(
        db: &DatabaseConnection,
        auth: &AuthUser,
    ) -> Result<users::Model, ApiError> {
        users::Entity::find_by_id(auth.user_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ApiError::Unauthenticated("Token refers to a deleted account".to_string())
            })
    }

    fn generate_code() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn account(id: i32, username: &str, email: &str, code: Option<&str>) -> users::Model {
        users::Model {
            id,
            username: username.to_string(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            bio: None,
            role: UserRole::User,
            is_superuser: false,
            confirmation_code: code.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_account_and_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // Recherche par username puis par email: rien
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([Vec::<users::Model>::new()])
            // INSERT ... RETURNING
            .append_query_results([vec![account(1, "alice", "a@x.com", Some("c0de"))]])
            .into_connection();

        let user = AuthService::signup(&db, "alice", "a@x.com").await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.confirmation_code.is_some());
    }

    #[tokio::test]
    async fn test_signup_same_pair_is_a_resend() {
        let existing = account(1, "alice", "a@x.com", Some("old-code"));
        let rotated = account(1, "alice", "a@x.com", Some("new-code"));

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([vec![existing]])
            // UPDATE ... RETURNING
            .append_query_results([vec![rotated]])
            .into_connection();

        let user = AuthService::signup(&db, "alice", "a@x.com").await.unwrap();
        assert_eq!(user.confirmation_code.as_deref(), Some("new-code"));
    }

    #[tokio::test]
    async fn test_signup_username_taken_by_other_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account(1, "alice", "autre@x.com", None)]])
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let result = AuthService::signup(&db, "alice", "a@x.com").await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_email_taken_by_other_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .append_query_results([vec![account(2, "bob", "a@x.com", None)]])
            .into_connection();

        let result = AuthService::signup(&db, "alice", "a@x.com").await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_signup_rejects_reserved_username() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let result = AuthService::signup(&db, "me", "a@x.com").await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_token_with_wrong_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account(1, "alice", "a@x.com", Some("bon-code"))]])
            .into_connection();

        let result = AuthService::issue_token(&db, "alice", "mauvais-code").await;
        assert!(matches!(result, Err(ApiError::AuthFailed(_))));
    }

    #[tokio::test]
    async fn test_token_with_correct_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account(1, "alice", "a@x.com", Some("bon-code"))]])
            .into_connection();

        let token = AuthService::issue_token(&db, "alice", "bon-code")
            .await
            .unwrap();
        let claims = jwt::verify_token(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_token_for_unknown_username() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let result = AuthService::issue_token(&db, "ghost", "code").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_token_when_no_code_was_issued() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account(1, "alice", "a@x.com", None)]])
            .into_connection();

        let result = AuthService::issue_token(&db, "alice", "code").await;
        assert!(matches!(result, Err(ApiError::AuthFailed(_))));
    }
}
