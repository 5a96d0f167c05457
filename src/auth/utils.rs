//! Small helpers for login form validation.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Length of the one-time passcode sent after the password check.
pub const OTP_LENGTH: usize = 6;

/// Normalize an email for comparisons and for the pending-login record.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|regex| regex.is_match(email_normalized))
}

/// A complete one-time code: exactly six ASCII digits.
pub(crate) fn valid_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|byte| byte.is_ascii_digit())
}
