//! Input shape checks applied at the request boundary.
//!
//! These are advisory: the store re-checks anything that depends on other
//! rows (uniqueness) inside its own transaction.

use crate::error::CoreError;

/// Maximum username length (characters)
pub const MAX_USERNAME_LEN: usize = 64;

/// Maximum email length (characters)
pub const MAX_EMAIL_LEN: usize = 120;

/// Maximum "about me" length (characters)
pub const MAX_ABOUT_ME_LEN: usize = 140;

/// Maximum post and message body length (characters)
pub const MAX_BODY_LEN: usize = 140;

pub fn username(value: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation("Username is required".into()));
    }
    if value.chars().count() > MAX_USERNAME_LEN {
        return Err(CoreError::Validation(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LEN
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(CoreError::Validation(
            "Username may only contain letters, digits, '_', '.' and '-'".into(),
        ));
    }
    Ok(value.to_string())
}

pub fn email(value: &str) -> Result<String, CoreError> {
    let value = value.trim();
    let invalid = || CoreError::Validation("Invalid email address".into());

    if value.is_empty() {
        return Err(CoreError::Validation("Email is required".into()));
    }
    if value.chars().count() > MAX_EMAIL_LEN || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let dotted = domain.split('.').collect::<Vec<_>>();
    if dotted.len() < 2 || dotted.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(value.to_string())
}

pub fn password(value: &str, confirmation: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::Validation("Password is required".into()));
    }
    if value != confirmation {
        return Err(CoreError::Validation("Passwords must match".into()));
    }
    Ok(())
}

pub fn about_me(value: &str) -> Result<Option<String>, CoreError> {
    let value = value.trim();
    if value.chars().count() > MAX_ABOUT_ME_LEN {
        return Err(CoreError::Validation(format!(
            "About me must be {} characters or less",
            MAX_ABOUT_ME_LEN
        )));
    }
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Post and message bodies.
pub fn body(value: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::Validation("Say something".into()));
    }
    if value.chars().count() > MAX_BODY_LEN {
        return Err(CoreError::Validation(format!(
            "Must be {} characters or less",
            MAX_BODY_LEN
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed_and_bounded() {
        assert_eq!(username("  alice ").unwrap(), "alice");
        assert!(username("").is_err());
        assert!(username(&"a".repeat(65)).is_err());
        assert!(username("bob smith").is_err());
        assert!(username("bob.smith-2_x").is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(email("alice@example.com").is_ok());
        assert!(email("alice@example").is_err());
        assert!(email("alice.example.com").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("a@b@example.com").is_err());
        assert!(email("alice@example..com").is_err());
    }

    #[test]
    fn password_confirmation_must_match() {
        assert!(password("secret", "secret").is_ok());
        assert!(password("secret", "secreT").is_err());
        assert!(password("", "").is_err());
    }

    #[test]
    fn about_me_counts_characters_not_bytes() {
        assert!(about_me(&"é".repeat(140)).is_ok());
        assert!(about_me(&"é".repeat(141)).is_err());
        assert_eq!(about_me("   ").unwrap(), None);
    }

    #[test]
    fn body_rejects_blank_and_long() {
        assert_eq!(body("  hi  ").unwrap(), "hi");
        assert!(body("   ").is_err());
        assert!(body(&"x".repeat(141)).is_err());
        assert!(body(&"x".repeat(140)).is_ok());
    }
}
