//! Auth backend over the portal REST API (`/auth/*`).

use super::AuthBackend;
use crate::app::{ApiClient, AppConfig, AppError};
use crate::auth::types::{
    ForgotPasswordRequest, LoginReply, LoginRequest, LoginResponse, ResetPasswordRequest,
    SessionGrant, SessionResponse, ValidateResetTokenRequest, VerifyOtpRequest,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    api: ApiClient,
}

impl HttpBackend {
    /// # Errors
    /// Returns `AppError::Config` when the API base URL is unusable.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            api: ApiClient::new(config)?,
        })
    }

    #[must_use]
    pub const fn from_client(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    #[instrument(skip(self, password))]
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginReply, AppError> {
        let request = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self.api.post_json("/auth/login", &request).await?;

        if response.requires_otp {
            return Ok(LoginReply::OtpRequired);
        }

        match (response.token, response.user) {
            (Some(token), Some(user)) => Ok(LoginReply::Granted(SessionGrant::from(
                SessionResponse { token, user },
            ))),
            _ => Err(AppError::Parse(
                "Login response carried neither an OTP challenge nor a session".to_string(),
            )),
        }
    }

    #[instrument(skip(self, code))]
    async fn verify_code(&self, email: &str, code: &str) -> Result<SessionGrant, AppError> {
        let request = VerifyOtpRequest { email, otp: code };
        let response: SessionResponse = self.api.post_json("/auth/verify-otp", &request).await?;
        Ok(SessionGrant::from(response))
    }

    #[instrument(skip(self))]
    async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        self.api
            .post_json_empty("/auth/forgot-password", &ForgotPasswordRequest { email })
            .await
    }

    #[instrument(skip(self, token))]
    async fn validate_reset_token(&self, token: &str) -> Result<(), AppError> {
        self.api
            .post_json_empty(
                "/auth/validate-reset-token",
                &ValidateResetTokenRequest { token },
            )
            .await
    }

    #[instrument(skip(self, token, password))]
    async fn complete_reset(&self, token: &str, password: &SecretString) -> Result<(), AppError> {
        let request = ResetPasswordRequest {
            token,
            password: password.expose_secret(),
            confirm_password: password.expose_secret(),
        };
        self.api.post_json_empty("/auth/reset-password", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_placeholder_base_url() {
        let result = HttpBackend::new(&AppConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
