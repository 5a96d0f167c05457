//! Admin authentication: password login, one-time-passcode verification,
//! session persistence, logout, and the forgot/reset password flow. This module
//! sits on a security boundary and must never log passwords, codes or tokens.
//!
//! Flow Overview: `login` checks the email/password pair; the backend either
//! answers "OTP required" (the email is held as the pending login) or issues a
//! session directly. `verify_otp` exchanges the pending email and the code for a
//! session token and user record, which are persisted together. `logout` clears
//! both. Password reset is a separate flow keyed by a one-time token from a link
//! and never signs the user in.

mod authenticator;
pub mod backend;
mod error;
pub mod password;
mod session;
pub mod store;
pub mod types;
pub(crate) mod utils;

pub use authenticator::Authenticator;
pub use backend::{AuthBackend, DemoAccount, DemoBackend, HttpBackend};
pub use error::AuthError;
pub use session::SessionState;
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
pub use types::{FormResult, LoginOutcome, Role, User};
