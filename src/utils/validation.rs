use chrono::{Datelike, Utc};

use crate::errors::ApiError;

const MAX_LENGTH_USERNAME: usize = 150;
const MAX_LENGTH_SLUG: usize = 50;

/// Vérifie un username: "me" est réservé en permanence, longueur <= 150,
/// caractères word + .@+-
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username == "me" {
        return Err(ApiError::Validation(
            "Username 'me' is reserved".to_string(),
        ));
    }
    if username.is_empty() || username.chars().count() > MAX_LENGTH_USERNAME {
        return Err(ApiError::Validation(format!(
            "Username must be between 1 and {} characters",
            MAX_LENGTH_USERNAME
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "_.@+-".contains(c))
    {
        return Err(ApiError::Validation(
            "Username contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Vérifie un slug de catégorie/genre: [-a-zA-Z0-9_]+, longueur <= 50
pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if slug.is_empty() || slug.len() > MAX_LENGTH_SLUG {
        return Err(ApiError::Validation(format!(
            "Slug must be between 1 and {} characters",
            MAX_LENGTH_SLUG
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::Validation(
            "Slug may only contain letters, digits, hyphens and underscores".to_string(),
        ));
    }
    Ok(())
}

/// L'année d'une oeuvre ne peut pas être dans le futur
pub fn validate_year(year: i16) -> Result<(), ApiError> {
    let current_year = Utc::now().year();
    if i32::from(year) > current_year {
        return Err(ApiError::Validation(format!(
            "Year cannot be greater than {}",
            current_year
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_me_is_reserved() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("mee").is_ok());
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("alice.bob@x+y-z_1").is_ok());
        assert!(validate_username("alice bob").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_username_too_long() {
        let long = "a".repeat(151);
        assert!(validate_username(&long).is_err());
        let ok = "a".repeat(150);
        assert!(validate_username(&ok).is_ok());
    }

    #[test]
    fn test_slug() {
        assert!(validate_slug("science-fiction").is_ok());
        assert!(validate_slug("slug_2024").is_ok());
        assert!(validate_slug("pas d'espace").is_err());
        assert!(validate_slug("").is_err());
    }

    #[test]
    fn test_year_bound() {
        let current = Utc::now().year() as i16;
        assert!(validate_year(current).is_ok());
        assert!(validate_year(1984).is_ok());
        assert!(validate_year(current + 1).is_err());
    }
}
