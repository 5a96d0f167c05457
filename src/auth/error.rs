use thiserror::Error;

/// Failures of authenticator operations.
///
/// The `Display` text of every user-facing variant is safe to show in a form. The
/// last group of variants are caller or local-environment errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    InvalidOtp(String),
    #[error("{0}")]
    UnknownEmail(String),
    #[error("{0}")]
    RequestFailed(String),
    #[error("{0}")]
    InvalidOrExpiredToken(String),
    #[error("{0}")]
    PasswordTooWeak(String),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Network error. Please try again.")]
    NetworkError { detail: String },
    #[error("no login is awaiting OTP verification")]
    NoPendingLogin,
    #[error("session is still being restored")]
    SessionRestoring,
    #[error("already signed in as {0}")]
    AlreadyAuthenticated(String),
    #[error("this sign-in attempt was replaced by a newer one")]
    LoginSuperseded,
    #[error("failed to persist session: {0}")]
    Storage(String),
}

impl AuthError {
    /// Text for inline form feedback.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Misuse of the state machine rather than a rejected request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::NoPendingLogin | Self::SessionRestoring | Self::AlreadyAuthenticated(_)
        )
    }
}
