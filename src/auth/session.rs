//! The in-memory session record and the state it projects.

use super::types::{SessionGrant, User};
use secrecy::SecretString;

/// Where the authenticator currently stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Persisted state has not been read yet.
    Restoring,
    Anonymous,
    /// Password accepted; waiting for the one-time code sent to `email`.
    OtpPending { email: String },
    Authenticated(User),
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Mutable session record. Only the authenticator touches it, under its mutex.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) user: Option<User>,
    pub(crate) token: Option<SecretString>,
    pub(crate) pending_email: Option<String>,
    pub(crate) is_loading: bool,
}

impl Session {
    pub(crate) fn restoring() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        if self.is_loading {
            return SessionState::Restoring;
        }
        match (&self.user, &self.pending_email) {
            (Some(user), _) => SessionState::Authenticated(user.clone()),
            (None, Some(email)) => SessionState::OtpPending {
                email: email.clone(),
            },
            (None, None) => SessionState::Anonymous,
        }
    }

    pub(crate) fn authenticate(&mut self, grant: SessionGrant) {
        self.user = Some(grant.user);
        self.token = Some(grant.token);
        self.pending_email = None;
        self.is_loading = false;
    }

    pub(crate) fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.pending_email = None;
        self.is_loading = false;
    }
}
