//! # mcc-admin (Admin Portal Session & Content Client)
//!
//! `mcc-admin` is the client side of the Model College, Chatra admin portal. It
//! owns the admin session: password login, one-time-passcode verification,
//! logout, and the forgot/reset password flow. The session survives restarts
//! through a persisted token and user record.
//!
//! ## Session Model
//!
//! A single [`auth::Authenticator`] is created per process and passed explicitly to
//! whatever needs it. It moves through `Restoring -> Anonymous -> OtpPending ->
//! Authenticated` and back to `Anonymous` on logout.
//!
//! - **Backends:** the authenticator talks to an [`auth::AuthBackend`]. The
//!   [`auth::HttpBackend`] calls the portal API; the [`auth::DemoBackend`] keeps
//!   accounts in memory for demos and tests.
//! - **Persistence:** the bearer token and the serialized user are stored together
//!   through a [`auth::SessionStore`]; both are present or neither is.
//!
//! ## Content API
//!
//! [`content::ContentClient`] wraps the admin CRUD endpoints (notices, events,
//! faculty, courses, results, examination, pages, media) and attaches the session
//! token as a bearer credential.

pub mod app;
pub mod auth;
pub mod cli;
pub mod content;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
