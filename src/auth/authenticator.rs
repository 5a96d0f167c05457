//! The admin session state machine.
//!
//! `Restoring -> Anonymous -> OtpPending -> Authenticated`, and back to
//! `Anonymous` on logout. Every mutation of the session record, including the
//! matching write to the session store, happens under one mutex, so no caller
//! ever observes a token without its user record. The mutex is never held across
//! a backend call.

use super::{
    backend::AuthBackend,
    error::AuthError,
    password::check_new_password,
    session::{Session, SessionState},
    store::SessionStore,
    types::{LoginOutcome, LoginReply, SessionGrant, User},
    utils::{normalize_email, valid_email, valid_otp},
};
use crate::app::AppError;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const MISSING_CREDENTIALS: &str = "Please enter your email and password";
const INVALID_OTP: &str = "Invalid OTP";
const INCOMPLETE_OTP: &str = "Please enter complete OTP";
const INVALID_EMAIL: &str = "Please enter a valid email address";
const UNKNOWN_EMAIL: &str = "Email not found";
const RESET_LINK_FAILED: &str = "Failed to send reset link";
const RESET_FAILED: &str = "Failed to reset password";
const WEAK_PASSWORD: &str = "Password does not meet the password policy";
const INVALID_RESET_TOKEN: &str =
    "This password reset link is invalid or has expired. Please request a new one.";
const SERVER_ERROR: &str = "Server error. Please try again later.";
const UNEXPECTED_RESPONSE: &str = "Unexpected response from server. Please try again.";

pub struct Authenticator {
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn SessionStore>,
    session: Mutex<Session>,
    reveal_unknown_email: bool,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("state", &self.state())
            .field("reveal_unknown_email", &self.reveal_unknown_email)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Creates an authenticator in the `Restoring` state.
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            backend,
            store,
            session: Mutex::new(Session::restoring()),
            reveal_unknown_email: false,
        }
    }

    /// Creates an authenticator and immediately restores the persisted session.
    #[must_use]
    pub fn restored(backend: Arc<dyn AuthBackend>, store: Arc<dyn SessionStore>) -> Self {
        let authenticator = Self::new(backend, store);
        authenticator.restore();
        authenticator
    }

    /// Lets `forgot_password` report unknown addresses. Only for demo setups:
    /// with a real backend this would allow account enumeration.
    #[must_use]
    pub const fn with_unknown_email_disclosure(mut self, reveal: bool) -> Self {
        self.reveal_unknown_email = reveal;
        self
    }

    /// Reads the persisted token and user once and settles the session.
    ///
    /// A user record that does not parse is discarded together with its token,
    /// and so is a record missing either value (empty strings count as missing).
    /// Calling this again after the session settled is a no-op.
    pub fn restore(&self) -> SessionState {
        let mut session = self.lock();
        if !session.is_loading {
            return session.state();
        }

        let entries = match self.store.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("discarding unreadable session storage: {err}");
                self.clear_store();
                session.clear();
                return session.state();
            }
        };

        let token = entries.token.filter(|value| !value.trim().is_empty());
        let user = entries.user.filter(|value| !value.trim().is_empty());

        match (token, user) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => {
                    debug!("restored persisted session");
                    session.authenticate(SessionGrant {
                        token: SecretString::from(token),
                        user,
                    });
                }
                Err(err) => {
                    warn!("discarding corrupted persisted user: {err}");
                    self.clear_store();
                    session.clear();
                }
            },
            (None, None) => session.clear(),
            _ => {
                warn!("discarding incomplete persisted session");
                self.clear_store();
                session.clear();
            }
        }

        session.state()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().user.is_some()
    }

    /// True only until the persisted session has been restored.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    #[must_use]
    pub fn pending_email(&self) -> Option<String> {
        self.lock().pending_email.clone()
    }

    /// Token to send as a bearer credential to the content API.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.lock().token.clone()
    }

    /// Checks credentials. Either asks for a one-time code (`OtpPending`) or,
    /// when the backend grants a session directly, persists it (`Authenticated`).
    ///
    /// A login issued while another one awaits its code replaces it.
    ///
    /// # Errors
    /// `InvalidCredentials` when the pair is rejected, `NetworkError` when the
    /// backend cannot be reached; the session is left untouched in both cases.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        self.ensure_can_login()?;

        let email = normalize_email(email);
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::InvalidCredentials(MISSING_CREDENTIALS.to_string()));
        }

        let reply = self
            .backend
            .authenticate(&email, password)
            .await
            .map_err(|err| {
                map_backend_error(err, |message| {
                    AuthError::InvalidCredentials(or_default(message, INVALID_CREDENTIALS))
                })
            })?;

        let mut session = self.lock();
        match reply {
            LoginReply::OtpRequired => {
                if let Some(user) = &session.user {
                    return Err(AuthError::AlreadyAuthenticated(user.email.clone()));
                }
                session.pending_email = Some(email);
                info!("credentials accepted, awaiting one-time code");
                Ok(LoginOutcome::OtpRequired)
            }
            LoginReply::Granted(grant) => {
                self.persist(&grant)?;
                let user = grant.user.clone();
                session.authenticate(grant);
                info!("signed in without one-time code");
                Ok(LoginOutcome::Authenticated(user))
            }
        }
    }

    /// Completes a login with the one-time code sent to the pending email.
    ///
    /// The pending email is read once, before the backend call. If another login
    /// replaced it while the code was being checked, the result is discarded.
    ///
    /// # Errors
    /// `NoPendingLogin` outside `OtpPending`; `InvalidOtp` for a wrong or
    /// incomplete code (the session stays `OtpPending`); `LoginSuperseded` when a
    /// newer login replaced this one; `NetworkError` when the backend is unreachable.
    #[instrument(skip_all)]
    pub async fn verify_otp(&self, code: &str) -> Result<User, AuthError> {
        let email = {
            let session = self.lock();
            if session.is_loading {
                return Err(AuthError::SessionRestoring);
            }
            match (&session.pending_email, &session.user) {
                (Some(email), _) => email.clone(),
                (None, Some(user)) => return Err(AuthError::AlreadyAuthenticated(user.email.clone())),
                (None, None) => return Err(AuthError::NoPendingLogin),
            }
        };

        let code = code.trim();
        if !valid_otp(code) {
            return Err(AuthError::InvalidOtp(INCOMPLETE_OTP.to_string()));
        }

        let grant = self
            .backend
            .verify_code(&email, code)
            .await
            .map_err(|err| {
                map_backend_error(err, |message| {
                    AuthError::InvalidOtp(or_default(message, INVALID_OTP))
                })
            })?;

        let mut session = self.lock();
        if session.pending_email.as_deref() == Some(email.as_str()) {
            self.persist(&grant)?;
            let user = grant.user.clone();
            session.authenticate(grant);
            info!("one-time code accepted, session established");
            return Ok(user);
        }

        // A duplicate submission that lost the race to an identical one.
        if let Some(user) = session
            .user
            .as_ref()
            .filter(|user| normalize_email(&user.email) == email)
        {
            return Ok(user.clone());
        }

        warn!("discarding one-time code result for a replaced login");
        Err(AuthError::LoginSuperseded)
    }

    /// Clears the session locally and in storage. Always ends `Anonymous`.
    pub fn logout(&self) {
        let mut session = self.lock();
        self.clear_store();
        session.clear();
        info!("signed out");
    }

    /// Asks the backend to mail a reset link. Does not change the session.
    ///
    /// # Errors
    /// `RequestFailed` for a malformed address or a rejected request,
    /// `UnknownEmail` only when unknown-email disclosure is enabled,
    /// `NetworkError` when the backend is unreachable.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        if self.is_loading() {
            return Err(AuthError::SessionRestoring);
        }

        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::RequestFailed(INVALID_EMAIL.to_string()));
        }

        match self.backend.request_reset(&email).await {
            Ok(()) => {
                info!("password reset link dispatched");
                Ok(())
            }
            Err(AppError::Http {
                status: 404,
                message,
            }) => {
                if self.reveal_unknown_email {
                    Err(AuthError::UnknownEmail(or_default(message, UNKNOWN_EMAIL)))
                } else {
                    debug!("reset requested for an unknown address; reporting success");
                    Ok(())
                }
            }
            Err(err) => Err(map_backend_error(err, |message| {
                AuthError::RequestFailed(or_default(message, RESET_LINK_FAILED))
            })),
        }
    }

    /// Checks a reset token before the new-password form is shown.
    ///
    /// When the backend cannot be reached the token is treated as valid and the
    /// reset request itself decides.
    ///
    /// # Errors
    /// `InvalidOrExpiredToken` when the token is missing or rejected.
    #[instrument(skip_all)]
    pub async fn validate_reset_token(&self, token: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidOrExpiredToken(INVALID_RESET_TOKEN.to_string()));
        }

        match self.backend.validate_reset_token(token).await {
            Ok(()) => Ok(()),
            Err(AppError::Http { message, .. }) => Err(AuthError::InvalidOrExpiredToken(
                or_default(message, INVALID_RESET_TOKEN),
            )),
            Err(err) => {
                warn!("could not validate reset token, deferring to reset: {err}");
                Ok(())
            }
        }
    }

    /// Sets a new password using a reset token. The session is not signed in;
    /// the user logs in afterwards with the new password.
    ///
    /// # Errors
    /// `PasswordTooWeak` or `PasswordMismatch` before any request is made;
    /// `InvalidOrExpiredToken` when the token is missing or refused;
    /// `RequestFailed` or `NetworkError` otherwise.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidOrExpiredToken(INVALID_RESET_TOKEN.to_string()));
        }

        check_new_password(password.expose_secret(), confirm_password.expose_secret())?;

        self.backend
            .complete_reset(token, password)
            .await
            .map_err(|err| match err {
                AppError::Http {
                    status: 401 | 403 | 404 | 410,
                    message,
                } => AuthError::InvalidOrExpiredToken(or_default(message, INVALID_RESET_TOKEN)),
                AppError::Http {
                    status: 422,
                    message,
                } => AuthError::PasswordTooWeak(or_default(message, WEAK_PASSWORD)),
                other => map_backend_error(other, |message| {
                    AuthError::RequestFailed(or_default(message, RESET_FAILED))
                }),
            })?;

        info!("password reset completed");
        Ok(())
    }

    fn ensure_can_login(&self) -> Result<(), AuthError> {
        let session = self.lock();
        if session.is_loading {
            return Err(AuthError::SessionRestoring);
        }
        if let Some(user) = &session.user {
            return Err(AuthError::AlreadyAuthenticated(user.email.clone()));
        }
        Ok(())
    }

    /// Writes token and user together. Callers hold the session lock.
    fn persist(&self, grant: &SessionGrant) -> Result<(), AuthError> {
        let user_json =
            serde_json::to_string(&grant.user).map_err(|err| AuthError::Storage(err.to_string()))?;
        self.store
            .save(&grant.token, &user_json)
            .map_err(|err| AuthError::Storage(err.to_string()))
    }

    fn clear_store(&self) {
        if let Err(err) = self.store.clear() {
            warn!("failed to clear persisted session: {err}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn or_default(message: Option<String>, default: &str) -> String {
    message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Splits backend failures into "could not ask", "server broke" and "rejected".
fn map_backend_error(
    err: AppError,
    rejected: impl FnOnce(Option<String>) -> AuthError,
) -> AuthError {
    if err.is_transport() {
        warn!("auth request could not be completed: {err}");
        return AuthError::NetworkError {
            detail: err.to_string(),
        };
    }

    match err {
        AppError::Http { status, message } if status >= 500 => {
            warn!(status, "auth backend failed");
            AuthError::RequestFailed(or_default(message, SERVER_ERROR))
        }
        AppError::Http { message, .. } => rejected(message),
        other => {
            warn!("unexpected auth response: {other}");
            AuthError::RequestFailed(UNEXPECTED_RESPONSE.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::backend::{DEMO_EMAIL, DEMO_OTP, DEMO_PASSWORD, DemoBackend};
    use crate::auth::store::MemoryStore;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn demo() -> (Authenticator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let auth = Authenticator::restored(Arc::new(DemoBackend::new()), store.clone());
        (auth, store)
    }

    #[test]
    fn starts_restoring_and_settles_anonymous() {
        let store = Arc::new(MemoryStore::new());
        let auth = Authenticator::new(Arc::new(DemoBackend::new()), store);
        assert!(auth.is_loading());
        assert_eq!(auth.state(), SessionState::Restoring);

        assert_eq!(auth.restore(), SessionState::Anonymous);
        assert!(!auth.is_loading());
    }

    const USER_JSON: &str =
        r#"{"id":"1","email":"admin@mcc.edu.in","name":"Admin User","role":"admin"}"#;

    #[test]
    fn half_persisted_session_is_cleared() {
        let cases = [
            (Some("tok"), None),
            (None, Some(USER_JSON)),
            (Some(""), Some(USER_JSON)),
            (Some("  "), Some(USER_JSON)),
            (Some("tok"), Some("")),
        ];
        for (token, user) in cases {
            let store = Arc::new(MemoryStore::with_entries(token, user));
            let auth = Authenticator::restored(Arc::new(DemoBackend::new()), store.clone());

            assert_eq!(auth.state(), SessionState::Anonymous, "{token:?} / {user:?}");
            assert!(auth.bearer_token().is_none());
            let entries = store.entries();
            assert!(entries.token.is_none(), "{token:?} / {user:?}");
            assert!(entries.user.is_none(), "{token:?} / {user:?}");
        }
    }

    #[test]
    fn complete_persisted_session_is_restored() {
        let store = Arc::new(MemoryStore::with_entries(Some("tok"), Some(USER_JSON)));
        let auth = Authenticator::restored(Arc::new(DemoBackend::new()), store.clone());

        assert!(auth.is_authenticated());
        assert_eq!(store.entries().token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn operations_wait_for_restore() {
        let auth = Authenticator::new(Arc::new(DemoBackend::new()), Arc::new(MemoryStore::new()));
        let result = auth.login(DEMO_EMAIL, &secret(DEMO_PASSWORD)).await;
        assert_eq!(result, Err(AuthError::SessionRestoring));
    }

    #[tokio::test]
    async fn empty_credentials_fail_locally() {
        let (auth, _) = demo();
        let result = auth.login("  ", &secret(DEMO_PASSWORD)).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
        let result = auth.login(DEMO_EMAIL, &secret("")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
        assert_eq!(auth.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn incomplete_code_keeps_pending_login() {
        let (auth, store) = demo();
        auth.login(DEMO_EMAIL, &secret(DEMO_PASSWORD)).await.unwrap();

        let result = auth.verify_otp("123").await;
        assert_eq!(
            result,
            Err(AuthError::InvalidOtp(INCOMPLETE_OTP.to_string()))
        );
        assert_eq!(auth.pending_email().as_deref(), Some(DEMO_EMAIL));
        assert!(store.entries().token.is_none());
    }

    #[tokio::test]
    async fn verify_without_login_is_an_internal_error() {
        let (auth, _) = demo();
        let err = auth.verify_otp(DEMO_OTP).await.unwrap_err();
        assert_eq!(err, AuthError::NoPendingLogin);
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn login_is_refused_while_authenticated() {
        let (auth, _) = demo();
        auth.login(DEMO_EMAIL, &secret(DEMO_PASSWORD)).await.unwrap();
        auth.verify_otp(DEMO_OTP).await.unwrap();

        let result = auth.login(DEMO_EMAIL, &secret(DEMO_PASSWORD)).await;
        assert!(matches!(result, Err(AuthError::AlreadyAuthenticated(_))));
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn duplicate_code_submission_is_idempotent() {
        let backend = DemoBackend::new().with_latency(std::time::Duration::from_millis(20));
        let auth = Authenticator::restored(Arc::new(backend), Arc::new(MemoryStore::new()));
        auth.login(DEMO_EMAIL, &secret(DEMO_PASSWORD)).await.unwrap();

        let (first, second) = tokio::join!(auth.verify_otp(DEMO_OTP), auth.verify_otp(DEMO_OTP));
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.email, DEMO_EMAIL);
        assert_eq!(second.email, DEMO_EMAIL);
        assert!(auth.is_authenticated());
    }

    #[test]
    fn backend_errors_are_split_by_cause() {
        let network = map_backend_error(AppError::Network("refused".to_string()), |_| {
            AuthError::InvalidCredentials(String::new())
        });
        assert!(matches!(network, AuthError::NetworkError { .. }));

        let server = map_backend_error(
            AppError::Http {
                status: 503,
                message: None,
            },
            |_| AuthError::InvalidCredentials(String::new()),
        );
        assert_eq!(server, AuthError::RequestFailed(SERVER_ERROR.to_string()));

        let rejected = map_backend_error(
            AppError::Http {
                status: 401,
                message: Some("Account locked".to_string()),
            },
            |message| AuthError::InvalidCredentials(or_default(message, INVALID_CREDENTIALS)),
        );
        assert_eq!(
            rejected,
            AuthError::InvalidCredentials("Account locked".to_string())
        );

        let parse = map_backend_error(AppError::Parse("eof".to_string()), |_| {
            AuthError::InvalidOtp(String::new())
        });
        assert_eq!(
            parse,
            AuthError::RequestFailed(UNEXPECTED_RESPONSE.to_string())
        );
    }
}
