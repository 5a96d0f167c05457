//! Password policy for the reset flow. Checks run locally, before any request,
//! in the same order the reset screen reports them: length, confirmation, then
//! character classes.

use super::error::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validates a new password and its confirmation.
///
/// # Errors
/// `PasswordTooWeak` for policy violations, `PasswordMismatch` when the
/// confirmation differs.
pub fn check_new_password(password: &str, confirm_password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooWeak(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }

    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_number = password.chars().any(|c| c.is_ascii_digit());

    if !has_uppercase || !has_lowercase || !has_number {
        return Err(AuthError::PasswordTooWeak(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        ));
    }

    Ok(())
}
