// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (rôles user/moderator/admin + code de confirmation)
//   - categories : Catégories d'oeuvres (données de référence, slug unique)
//   - genres : Genres d'oeuvres (données de référence, slug unique)
//   - titles : Oeuvres évaluées (année, description, une catégorie)
//   - title_genres : Jointure many-to-many titles <-> genres
//   - reviews : Avis (note 1-10, un seul avis par auteur et par oeuvre)
//   - comments : Commentaires sous un avis
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les suppressions en cascade (titles -> reviews -> comments,
//     users -> reviews/comments) sont portées par les FK en base
//   - La contrainte UNIQUE (author_id, title_id) vit dans la table reviews
//
// ============================================================================

pub mod categories;
pub mod comments;
pub mod dto;
pub mod genres;
pub mod health;
pub mod reviews;
pub mod title_genres;
pub mod titles;
pub mod users;
