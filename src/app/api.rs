//! HTTP helpers for the portal's JSON API with a consistent timeout, user agent
//! and error mapping. Auth and content clients go through these helpers so that
//! "the server rejected the request" and "the request never completed" are always
//! told apart. The bearer token is attached here and never logged.

use super::{config::AppConfig, errors::AppError};
use crate::APP_USER_AGENT;
use reqwest::{Client, RequestBuilder, Response, multipart::Form};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Maximum number of error body characters surfaced to the caller.
const MAX_ERROR_CHARS: usize = 200;

/// Thin JSON client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    bearer: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("bearer", &self.bearer.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client for `config.api_base_url`.
    ///
    /// # Errors
    /// Returns `AppError::Config` when the base URL is not an absolute http(s) URL
    /// or the HTTP client cannot be initialized.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)
            .map_err(|err| AppError::Config(format!("Invalid API base URL '{base_url}': {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Unsupported API base URL scheme: {}",
                parsed.scheme()
            )));
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            bearer: None,
        })
    }

    /// Attaches `Authorization: Bearer <token>` to every request when set.
    #[must_use]
    pub fn with_bearer(mut self, token: Option<SecretString>) -> Self {
        self.bearer = token;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches JSON from `path`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        handle_json_response(response).await
    }

    /// Posts a JSON body and parses a JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let payload = encode(body)?;
        let response = self.send(self.json_request(self.http.post(self.url(path)), payload)).await?;
        handle_json_response(response).await
    }

    /// Posts a JSON body and only checks the status code.
    pub async fn post_json_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), AppError> {
        let payload = encode(body)?;
        let response = self.send(self.json_request(self.http.post(self.url(path)), payload)).await?;
        handle_empty_response(response).await
    }

    /// Replaces a resource with a JSON body and parses the JSON response.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let payload = encode(body)?;
        let response = self.send(self.json_request(self.http.put(self.url(path)), payload)).await?;
        handle_json_response(response).await
    }

    /// Deletes a resource; any success status is accepted.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let response = self.send(self.http.delete(self.url(path))).await?;
        handle_empty_response(response).await
    }

    /// Posts a multipart form; reqwest sets the boundary content type.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, AppError> {
        let response = self.send(self.http.post(self.url(path)).multipart(form)).await?;
        handle_json_response(response).await
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    fn json_request(&self, builder: RequestBuilder, payload: String) -> RequestBuilder {
        builder
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AppError> {
        let builder = match &self.bearer {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };
        let response = builder.send().await.map_err(map_request_error)?;
        debug!(status = response.status().as_u16(), url = %response.url(), "api response");
        Ok(response)
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String, AppError> {
    serde_json::to_string(body)
        .map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))
}

/// Joins a base URL and a path with exactly one slash between them.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport failures into `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Config(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| AppError::Network(format!("Failed to read response: {err}")))?;

    if !status.is_success() {
        return Err(rejection(status.as_u16(), &bytes));
    }

    let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &bytes
    };
    serde_json::from_slice(body)
        .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
}

async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let bytes = response.bytes().await.unwrap_or_default();
    Err(rejection(status.as_u16(), &bytes))
}

fn rejection(status: u16, body: &[u8]) -> AppError {
    AppError::Http {
        status,
        message: error_message(body),
    }
}

/// Extracts `{message}` from a JSON error body, falling back to sanitized text.
fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        return map
            .get("message")
            .and_then(Value::as_str)
            .and_then(sanitize_body);
    }
    sanitize_body(&String::from_utf8_lossy(body))
}

/// Trims and truncates error text for user-facing messages.
fn sanitize_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_with_single_slash() {
        assert_eq!(
            build_url_with_base("https://mcc.edu.in/api/", "/auth/login"),
            "https://mcc.edu.in/api/auth/login"
        );
        assert_eq!(
            build_url_with_base("https://mcc.edu.in/api", "notices"),
            "https://mcc.edu.in/api/notices"
        );
        assert_eq!(build_url_with_base("", "/notices"), "/notices");
    }

    #[test]
    fn error_message_prefers_json_message_field() {
        let body = br#"{"message":"Invalid credentials","code":401}"#;
        assert_eq!(error_message(body), Some("Invalid credentials".to_string()));
    }

    #[test]
    fn error_message_ignores_json_without_message() {
        assert_eq!(error_message(br#"{"error":"nope"}"#), None);
        assert_eq!(error_message(b"   "), None);
    }

    #[test]
    fn error_message_truncates_plain_text() {
        let body = "x".repeat(500);
        let message = error_message(body.as_bytes()).unwrap_or_default();
        assert_eq!(message.len(), MAX_ERROR_CHARS);
    }

    #[test]
    fn new_rejects_relative_base_url() {
        let config = AppConfig::new("/api");
        let err = ApiClient::new(&config).err();
        assert!(matches!(err, Some(AppError::Config(_))));
    }

    #[test]
    fn new_accepts_http_base_url_and_trims_slash() {
        let config = AppConfig::new("http://127.0.0.1:8080/api/");
        let client = ApiClient::new(&config);
        assert!(client.is_ok());
        if let Ok(client) = client {
            assert_eq!(client.base_url(), "http://127.0.0.1:8080/api");
        }
    }
}
