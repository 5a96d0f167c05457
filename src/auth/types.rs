//! Identity records, wire payloads for the auth API, and operation outcomes.
//! Request payloads carry passwords and one-time codes, so they must never be
//! logged; tokens are wrapped in `SecretString` as soon as they leave the wire.

use super::error::AuthError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The portal has a single role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Identity record returned by the API and persisted next to the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `{requiresOtp: true}` or `{token, user}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub requires_otp: bool,
    pub token: Option<String>,
    pub user: Option<User>,
}

#[derive(Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

#[derive(Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub struct ValidateResetTokenRequest<'a> {
    pub token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Token and identity issued by the backend for an authenticated session.
#[derive(Clone, Debug)]
pub struct SessionGrant {
    pub token: SecretString,
    pub user: User,
}

impl From<SessionResponse> for SessionGrant {
    fn from(response: SessionResponse) -> Self {
        Self {
            token: SecretString::from(response.token),
            user: response.user,
        }
    }
}

/// Backend answer to a credential check.
#[derive(Clone, Debug)]
pub enum LoginReply {
    OtpRequired,
    Granted(SessionGrant),
}

/// Result of a successful `login` as seen by callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    OtpRequired,
    Authenticated(User),
}

/// Presentation-friendly result: `{success, error?, requiresOtp?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_otp: Option<bool>,
}

impl FormResult {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
            requires_otp: None,
        }
    }

    #[must_use]
    pub fn failed(error: &AuthError) -> Self {
        Self {
            success: false,
            error: Some(error.user_message()),
            requires_otp: None,
        }
    }

    /// Maps a `login` result, flagging the OTP step.
    #[must_use]
    pub fn from_login(result: &Result<LoginOutcome, AuthError>) -> Self {
        match result {
            Ok(LoginOutcome::OtpRequired) => Self {
                requires_otp: Some(true),
                ..Self::ok()
            },
            Ok(LoginOutcome::Authenticated(_)) => Self::ok(),
            Err(err) => Self::failed(err),
        }
    }

    #[must_use]
    pub fn from_result<T>(result: &Result<T, AuthError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self::failed(err),
        }
    }
}
