//! In-memory auth backend for demos and tests. Accounts, one-time codes and
//! reset tokens live in process memory; reset links are collected in an outbox
//! instead of being mailed.

use super::AuthBackend;
use crate::app::AppError;
use crate::auth::types::{LoginReply, Role, SessionGrant, User};
use crate::auth::utils::normalize_email;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tracing::info;
use ulid::Ulid;

pub const DEMO_EMAIL: &str = "admin@mcc.edu.in";
pub const DEMO_PASSWORD: &str = "Admin@123";
pub const DEMO_OTP: &str = "123456";

const DEMO_USER_ID: &str = "demo-admin-001";
const DEMO_USER_NAME: &str = "Admin User";

/// A login the demo backend accepts.
#[derive(Clone, Debug)]
pub struct DemoAccount {
    pub user: User,
    password: SecretString,
    otp: String,
}

impl DemoAccount {
    #[must_use]
    pub fn new(user: User, password: &str, otp: &str) -> Self {
        Self {
            user,
            password: SecretString::from(password.to_string()),
            otp: otp.to_string(),
        }
    }

    /// The portal's demo administrator.
    #[must_use]
    pub fn admin() -> Self {
        Self::new(
            User {
                id: DEMO_USER_ID.to_string(),
                email: DEMO_EMAIL.to_string(),
                name: DEMO_USER_NAME.to_string(),
                role: Role::Admin,
            },
            DEMO_PASSWORD,
            DEMO_OTP,
        )
    }
}

/// A reset link "sent" by the demo backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoMail {
    pub to: String,
    pub reset_token: String,
}

#[derive(Default)]
struct DemoState {
    accounts: HashMap<String, DemoAccount>,
    reset_tokens: HashMap<String, String>,
    outbox: Vec<DemoMail>,
}

pub struct DemoBackend {
    state: Mutex<DemoState>,
    latency: Duration,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DemoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoBackend")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl DemoBackend {
    /// Demo backend with the default administrator and no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::empty().with_account(DemoAccount::admin())
    }

    /// Demo backend without any accounts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(DemoState::default()),
            latency: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_account(self, account: DemoAccount) -> Self {
        self.lock()
            .accounts
            .insert(normalize_email(&account.user.email), account);
        self
    }

    /// Simulated round-trip time applied to every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Re-arm reset tokens issued by an earlier demo backend. Tokens for
    /// unknown accounts are dropped.
    #[must_use]
    pub fn with_pending_resets(self, mails: impl IntoIterator<Item = DemoMail>) -> Self {
        {
            let mut state = self.lock();
            for mail in mails {
                let email = normalize_email(&mail.to);
                if !state.accounts.contains_key(&email) {
                    continue;
                }
                state
                    .reset_tokens
                    .insert(mail.reset_token.clone(), email.clone());
                state.outbox.push(DemoMail {
                    to: email,
                    reset_token: mail.reset_token,
                });
            }
        }
        self
    }

    /// Reset tokens issued and not yet used, oldest first.
    #[must_use]
    pub fn pending_resets(&self) -> Vec<DemoMail> {
        let state = self.lock();
        state
            .outbox
            .iter()
            .filter(|mail| state.reset_tokens.contains_key(&mail.reset_token))
            .cloned()
            .collect()
    }

    /// Reset links dispatched so far.
    #[must_use]
    pub fn outbox(&self) -> Vec<DemoMail> {
        self.lock().outbox.clone()
    }

    /// Most recent reset token sent to `email`.
    #[must_use]
    pub fn last_reset_token(&self, email: &str) -> Option<String> {
        let email = normalize_email(email);
        self.lock()
            .outbox
            .iter()
            .rev()
            .find(|mail| mail.to == email)
            .map(|mail| mail.reset_token.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DemoState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn rejected(status: u16, message: &str) -> AppError {
    AppError::Http {
        status,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl AuthBackend for DemoBackend {
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginReply, AppError> {
        self.simulate_latency().await;

        let state = self.lock();
        match state.accounts.get(&normalize_email(email)) {
            Some(account) if account.password.expose_secret() == password.expose_secret() => {
                Ok(LoginReply::OtpRequired)
            }
            _ => Err(rejected(401, "Invalid credentials.")),
        }
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<SessionGrant, AppError> {
        self.simulate_latency().await;

        let state = self.lock();
        match state.accounts.get(&normalize_email(email)) {
            Some(account) if account.otp == code => Ok(SessionGrant {
                token: SecretString::from(format!("demo-session-{}", Ulid::new())),
                user: account.user.clone(),
            }),
            _ => Err(rejected(401, "Invalid OTP.")),
        }
    }

    async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        self.simulate_latency().await;

        let email = normalize_email(email);
        let mut state = self.lock();
        if !state.accounts.contains_key(&email) {
            return Err(rejected(404, "Email not found."));
        }

        let reset_token = Ulid::new().to_string();
        state.reset_tokens.insert(reset_token.clone(), email.clone());
        state.outbox.push(DemoMail {
            to: email.clone(),
            reset_token,
        });
        info!(to = %email, "demo reset link queued");
        Ok(())
    }

    async fn validate_reset_token(&self, token: &str) -> Result<(), AppError> {
        self.simulate_latency().await;

        if self.lock().reset_tokens.contains_key(token) {
            Ok(())
        } else {
            Err(rejected(410, "Invalid or expired reset token."))
        }
    }

    async fn complete_reset(&self, token: &str, password: &SecretString) -> Result<(), AppError> {
        self.simulate_latency().await;

        let mut state = self.lock();
        let Some(email) = state.reset_tokens.remove(token) else {
            return Err(rejected(410, "Invalid or expired reset token."));
        };
        if let Some(account) = state.accounts.get_mut(&email) {
            account.password = password.clone();
        }
        Ok(())
    }
}
