//! Backend seam for the authenticator. The authenticator depends only on this
//! trait; the HTTP client and the in-memory demo implementation both satisfy it.

mod demo;
mod http;

pub use demo::{DEMO_EMAIL, DEMO_OTP, DEMO_PASSWORD, DemoAccount, DemoBackend, DemoMail};
pub use http::HttpBackend;

use super::types::{LoginReply, SessionGrant};
use crate::app::AppError;
use async_trait::async_trait;
use secrecy::SecretString;

/// Capabilities the authenticator needs from whoever checks credentials.
///
/// `AppError::Http` means the backend rejected the request; transport variants
/// mean it could not be asked.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Checks an email/password pair.
    async fn authenticate(&self, email: &str, password: &SecretString)
    -> Result<LoginReply, AppError>;

    /// Checks the one-time code sent for `email` and issues a session.
    async fn verify_code(&self, email: &str, code: &str) -> Result<SessionGrant, AppError>;

    /// Dispatches a reset link for `email`.
    async fn request_reset(&self, email: &str) -> Result<(), AppError>;

    /// Checks that a reset token is still usable.
    async fn validate_reset_token(&self, token: &str) -> Result<(), AppError>;

    /// Sets a new password and consumes the reset token.
    async fn complete_reset(&self, token: &str, password: &SecretString) -> Result<(), AppError>;
}
