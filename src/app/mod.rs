//! Shared client utilities: API access, configuration and errors.
//!
//! Centralizing these helpers keeps network behavior consistent between the auth
//! backend and the content client. They handle the bearer token but never log
//! it; callers must still avoid logging passwords or one-time codes.

pub mod api;
pub mod config;
pub mod errors;

pub use api::ApiClient;
pub use config::AppConfig;
pub use errors::AppError;
