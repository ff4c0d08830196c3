/**
 * Request Field Validation
 *
 * Validators for user-supplied fields. Each returns `None` when the value
 * is acceptable or a `FieldError` describing the first rule that failed;
 * handlers collect the failures into a 400 `VALIDATION_ERROR` response.
 */

use crate::error::FieldError;

/// Minimum username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length.
pub const USERNAME_MAX: usize = 30;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum conversation title length.
pub const TITLE_MAX: usize = 100;
/// Maximum message content length.
pub const CONTENT_MAX: usize = 10_000;

/// Validate a username: 3-30 chars, letters, digits, and underscores only.
pub fn validate_username(username: &str) -> Option<FieldError> {
    if username.len() < USERNAME_MIN || username.len() > USERNAME_MAX {
        return Some(FieldError::new(
            "username",
            "Username must be between 3 and 30 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Some(FieldError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    None
}

/// Validate a password: minimum length only, no composition rules.
pub fn validate_password(password: &str) -> Option<FieldError> {
    if password.len() < PASSWORD_MIN {
        return Some(FieldError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    None
}

/// Validate a conversation title (already trimmed by the caller).
pub fn validate_title(title: &str) -> Option<FieldError> {
    if title.is_empty() {
        return Some(FieldError::new("title", "Conversation title is required"));
    }
    if title.len() > TITLE_MAX {
        return Some(FieldError::new(
            "title",
            "Title cannot exceed 100 characters",
        ));
    }
    None
}

/// Validate message content (already trimmed by the caller).
pub fn validate_content(content: &str) -> Option<FieldError> {
    if content.is_empty() {
        return Some(FieldError::new("content", "Message content is required"));
    }
    if content.len() > CONTENT_MAX {
        return Some(FieldError::new(
            "content",
            "Message content cannot exceed 10000 characters",
        ));
    }
    None
}

/// Validate a preferences theme value.
pub fn validate_theme(theme: &str) -> Option<FieldError> {
    if theme == "light" || theme == "dark" {
        None
    } else {
        Some(FieldError::new(
            "preferences.theme",
            "Theme must be either light or dark",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("abc").is_none());
        assert!(validate_username("user_42").is_none());
        assert!(validate_username(&"a".repeat(30)).is_none());
    }

    #[test]
    fn test_username_length_bounds() {
        assert!(validate_username("ab").is_some());
        assert!(validate_username(&"a".repeat(31)).is_some());
        assert!(validate_username("").is_some());
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("user name").is_some());
        assert!(validate_username("user-name").is_some());
        assert!(validate_username("user@name").is_some());
    }

    #[test]
    fn test_password_minimum() {
        assert!(validate_password("short").is_some());
        assert!(validate_password("longenough").is_none());
    }

    #[test]
    fn test_title_bounds() {
        assert!(validate_title("").is_some());
        assert!(validate_title("Hello").is_none());
        assert!(validate_title(&"t".repeat(101)).is_some());
    }

    #[test]
    fn test_content_bounds() {
        assert!(validate_content("").is_some());
        assert!(validate_content("hi").is_none());
        assert!(validate_content(&"x".repeat(10_001)).is_some());
    }

    #[test]
    fn test_theme_enum() {
        assert!(validate_theme("light").is_none());
        assert!(validate_theme("dark").is_none());
        assert!(validate_theme("solarized").is_some());
    }
}
