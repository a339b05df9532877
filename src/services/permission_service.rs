// ============================================================================
// SERVICE : PERMISSIONS
// ============================================================================
//
// Contrôle d'accès en deux phases, composées explicitement par les routes:
//
//   1. check_route : ce rôle peut-il tenter ce verbe sur cette classe de
//      ressource ? S'exécute AVANT toute résolution d'objet, pour qu'une
//      écriture anonyme échoue sans révéler l'existence de quoi que ce soit.
//   2. check_object : ce principal peut-il modifier CETTE instance déjà
//      résolue ? (auteur, modérateur ou admin)
//
// Table des droits (verbe x ressource):
//
//   | Ressource          | read    | create  | update/delete       |
//   |--------------------|---------|---------|---------------------|
//   | Catalog (cat/genre/titre) | tous | admin | admin               |
//   | Review / Comment   | tous    | authentifié | auteur/modo/admin |
//   | UserCollection     | admin   | admin   | admin               |
//
// Les lectures ne demandent jamais d'authentification, sauf la collection
// utilisateurs (admin). Le profil "self" est géré dans routes/users.rs via
// is_self_or_admin.
//
// ============================================================================

use crate::errors::ApiError;
use crate::models::users;

/// Classe de ressource visée par la requête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// Données de référence et oeuvres: categories, genres, titles
    Catalog,
    Review,
    Comment,
    /// La collection /users (administration)
    UserCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Read,
    Create,
    Update,
    Delete,
}

/// Phase 1: le contrôle de route. `principal` est None pour un anonyme.
pub fn check_route(
    principal: Option<&users::Model>,
    resource: ResourceClass,
    verb: Verb,
) -> Result<(), ApiError> {
    match (resource, verb) {
        // Lecture publique du catalogue, des avis et des commentaires
        (ResourceClass::Catalog, Verb::Read)
        | (ResourceClass::Review, Verb::Read)
        | (ResourceClass::Comment, Verb::Read) => Ok(()),

        // Écriture du catalogue: admin uniquement
        (ResourceClass::Catalog, _) => match principal {
            None => Err(unauthenticated()),
            Some(user) if user.is_admin() => Ok(()),
            Some(_) => Err(admin_only()),
        },

        // Création/modification d'avis et de commentaires: tout authentifié
        // (la phase 2 tranche ensuite sur l'instance)
        (ResourceClass::Review, _) | (ResourceClass::Comment, _) => match principal {
            None => Err(unauthenticated()),
            Some(_) => Ok(()),
        },

        // Collection utilisateurs: admin pour tous les verbes, lecture comprise
        (ResourceClass::UserCollection, _) => match principal {
            None => Err(unauthenticated()),
            Some(user) if user.is_admin() => Ok(()),
            Some(_) => Err(admin_only()),
        },
    }
}

/// Phase 2: le contrôle d'objet, sur une instance déjà résolue.
/// Ne s'applique qu'aux mutations d'avis et de commentaires.
pub fn check_object(principal: &users::Model, author_id: i32) -> Result<(), ApiError> {
    if principal.id == author_id || principal.is_moderator_or_above() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You can only modify your own content".to_string(),
        ))
    }
}

/// Accès au profil d'un utilisateur: le propriétaire ou un admin
pub fn is_self_or_admin(principal: &users::Model, owner_id: i32) -> bool {
    principal.id == owner_id || principal.is_admin()
}

fn unauthenticated() -> ApiError {
    ApiError::Unauthenticated("Authentication required".to_string())
}

fn admin_only() -> ApiError {
    ApiError::Forbidden("Administrator rights required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::UserRole;

    fn user(id: i32, role: UserRole) -> users::Model {
        users::Model {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            first_name: None,
            last_name: None,
            bio: None,
            role,
            is_superuser: false,
            confirmation_code: None,
        }
    }

    #[test]
    fn test_anonymous_can_read_everything_public() {
        for resource in [
            ResourceClass::Catalog,
            ResourceClass::Review,
            ResourceClass::Comment,
        ] {
            assert!(check_route(None, resource, Verb::Read).is_ok());
        }
    }

    #[test]
    fn test_anonymous_write_is_unauthenticated() {
        for resource in [
            ResourceClass::Catalog,
            ResourceClass::Review,
            ResourceClass::Comment,
            ResourceClass::UserCollection,
        ] {
            for verb in [Verb::Create, Verb::Update, Verb::Delete] {
                let result = check_route(None, resource, verb);
                assert!(
                    matches!(result, Err(ApiError::Unauthenticated(_))),
                    "{:?} {:?} should be rejected without a principal",
                    resource,
                    verb
                );
            }
        }
    }

    #[test]
    fn test_catalog_writes_are_admin_only() {
        let regular = user(1, UserRole::User);
        let moderator = user(2, UserRole::Moderator);
        let admin = user(3, UserRole::Admin);

        for verb in [Verb::Create, Verb::Update, Verb::Delete] {
            assert!(matches!(
                check_route(Some(&regular), ResourceClass::Catalog, verb),
                Err(ApiError::Forbidden(_))
            ));
            assert!(matches!(
                check_route(Some(&moderator), ResourceClass::Catalog, verb),
                Err(ApiError::Forbidden(_))
            ));
            assert!(check_route(Some(&admin), ResourceClass::Catalog, verb).is_ok());
        }
    }

    #[test]
    fn test_any_authenticated_user_may_attempt_review_writes() {
        let regular = user(1, UserRole::User);
        for verb in [Verb::Create, Verb::Update, Verb::Delete] {
            assert!(check_route(Some(&regular), ResourceClass::Review, verb).is_ok());
            assert!(check_route(Some(&regular), ResourceClass::Comment, verb).is_ok());
        }
    }

    #[test]
    fn test_user_collection_requires_admin_even_for_read() {
        let regular = user(1, UserRole::User);
        let moderator = user(2, UserRole::Moderator);
        let admin = user(3, UserRole::Admin);

        assert!(matches!(
            check_route(Some(&regular), ResourceClass::UserCollection, Verb::Read),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            check_route(Some(&moderator), ResourceClass::UserCollection, Verb::Read),
            Err(ApiError::Forbidden(_))
        ));
        assert!(check_route(Some(&admin), ResourceClass::UserCollection, Verb::Read).is_ok());
    }

    #[test]
    fn test_superuser_passes_admin_checks() {
        let mut superuser = user(4, UserRole::User);
        superuser.is_superuser = true;
        assert!(check_route(Some(&superuser), ResourceClass::Catalog, Verb::Create).is_ok());
        assert!(
            check_route(Some(&superuser), ResourceClass::UserCollection, Verb::Delete).is_ok()
        );
    }

    #[test]
    fn test_object_check_author() {
        let author = user(1, UserRole::User);
        let other = user(2, UserRole::User);

        assert!(check_object(&author, 1).is_ok());
        assert!(matches!(
            check_object(&other, 1),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_object_check_moderator_and_admin() {
        let moderator = user(2, UserRole::Moderator);
        let admin = user(3, UserRole::Admin);

        assert!(check_object(&moderator, 1).is_ok());
        assert!(check_object(&admin, 1).is_ok());
    }

    #[test]
    fn test_is_self_or_admin() {
        let regular = user(1, UserRole::User);
        let admin = user(3, UserRole::Admin);

        assert!(is_self_or_admin(&regular, 1));
        assert!(!is_self_or_admin(&regular, 2));
        assert!(is_self_or_admin(&admin, 2));
    }
}
