//! Client-side credential validation.
//!
//! Every check here runs before the identity service is contacted, so a
//! malformed form never costs a round trip.

use univent_core::{Result, UniventError};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate email address format.
///
/// - Must not be empty (after trimming)
/// - Must contain exactly one `@`
/// - Local and domain parts must be non-empty
///
/// # Examples
///
/// ```
/// use univent_auth::validation::is_valid_email;
///
/// assert!(is_valid_email("alex@university.edu"));
/// assert!(!is_valid_email("alex.university.edu"));
/// assert!(!is_valid_email("@university.edu"));
/// assert!(!is_valid_email("alex@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Require a non-blank field.
///
/// # Errors
///
/// Returns a validation error naming `field` when `value` is blank.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UniventError::validation(field, format!("{} is required", display_name(field))));
    }
    Ok(())
}

/// Validate an email address.
///
/// # Errors
///
/// Returns a validation error when the address is blank or malformed.
pub fn validate_email(email: &str) -> Result<()> {
    require("email", email)?;
    if !is_valid_email(email) {
        return Err(UniventError::validation("email", "Please enter a valid email address"));
    }
    Ok(())
}

/// Validate a password.
///
/// # Errors
///
/// Returns a validation error when the password is empty or shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(UniventError::validation("password", "Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UniventError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn display_name(field: &str) -> String {
    let mut name = field.replace('_', " ");
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    name
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use univent_core::ErrorKind;

    #[test]
    fn email_without_at_is_rejected() {
        let err = validate_email("alex.university.edu").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err,
            UniventError::validation("email", "Please enter a valid email address")
        );
    }

    #[test]
    fn blank_email_is_required() {
        assert_eq!(
            validate_email("   ").unwrap_err(),
            UniventError::validation("email", "Email is required")
        );
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password("ñandú!").is_ok());
    }

    #[test]
    fn required_field_names_are_humanized() {
        assert_eq!(
            require("first_name", " ").unwrap_err(),
            UniventError::validation("first_name", "First name is required")
        );
    }
}
