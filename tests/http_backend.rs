//! The HTTP backend and the content client against an in-process mock of the
//! portal API.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    extract::{Multipart, Path},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use mcc_admin::app::{AppConfig, AppError};
use mcc_admin::auth::{
    AuthError, Authenticator, HttpBackend, LoginOutcome, MemoryStore, SessionState,
};
use mcc_admin::content::{ContentClient, Resource};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

const ADMIN_EMAIL: &str = "admin@mcc.edu.in";
const ADMIN_PASSWORD: &str = "Admin@123";
const DIRECT_EMAIL: &str = "principal@mcc.edu.in";
const DIRECT_PASSWORD: &str = "Principal@123";
const SESSION_TOKEN: &str = "portal-session-token";

fn user(email: &str) -> Value {
    json!({"id": "u-1", "email": email, "name": "Portal Admin", "role": "admin"})
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some(ADMIN_EMAIL), Some(ADMIN_PASSWORD)) => {
            Json(json!({"requiresOtp": true})).into_response()
        }
        (Some(DIRECT_EMAIL), Some(DIRECT_PASSWORD)) => {
            Json(json!({"token": SESSION_TOKEN, "user": user(DIRECT_EMAIL)})).into_response()
        }
        (Some("broken@mcc.edu.in"), _) => Json(json!({"ok": true})).into_response(),
        (Some("crash@mcc.edu.in"), _) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => reject(StatusCode::UNAUTHORIZED, "Email or password is incorrect"),
    }
}

async fn verify_otp(Json(body): Json<Value>) -> Response {
    match (body["email"].as_str(), body["otp"].as_str()) {
        (Some(email), Some("123456")) => {
            Json(json!({"token": SESSION_TOKEN, "user": user(email)})).into_response()
        }
        _ => reject(StatusCode::UNAUTHORIZED, "That code is not valid"),
    }
}

async fn forgot_password(Json(body): Json<Value>) -> Response {
    match body["email"].as_str() {
        Some(ADMIN_EMAIL) => Json(json!({"message": "sent"})).into_response(),
        _ => reject(StatusCode::NOT_FOUND, "Email not found"),
    }
}

async fn validate_reset_token(Json(body): Json<Value>) -> Response {
    match body["token"].as_str() {
        Some("good" | "weak") => StatusCode::OK.into_response(),
        _ => reject(StatusCode::GONE, "Reset link expired"),
    }
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body["password"] != body["confirmPassword"] {
        return reject(StatusCode::BAD_REQUEST, "Passwords differ");
    }
    match body["token"].as_str() {
        Some("good") => StatusCode::NO_CONTENT.into_response(),
        Some("weak") => reject(StatusCode::UNPROCESSABLE_ENTITY, "Password is too common"),
        Some("boom") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => reject(StatusCode::GONE, "Reset link expired"),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(&format!("Bearer {SESSION_TOKEN}")[..])
}

async fn list_notices(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Login required");
    }
    Json(json!([{"id": "1", "title": "Admissions open"}])).into_response()
}

async fn delete_notice(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Login required");
    }
    if id == "1" {
        StatusCode::NO_CONTENT.into_response()
    } else {
        reject(StatusCode::NOT_FOUND, "Notice not found")
    }
}

async fn upload_media(headers: HeaderMap, mut multipart: Multipart) -> Response {
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Login required");
    }
    let mut uploaded = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(ToString::to_string);
        let file_name = field.file_name().map(ToString::to_string);
        let size = field.bytes().await.map(|bytes| bytes.len()).unwrap_or(0);
        uploaded.push(json!({"field": name, "fileName": file_name, "size": size}));
    }
    Json(json!({ "uploaded": uploaded })).into_response()
}

async fn spawn_portal() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/validate-reset-token", post(validate_reset_token))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/notices", get(list_notices))
        .route("/api/notices/:id", delete(delete_notice))
        .route("/api/media/upload", post(upload_media));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api")
}

fn authenticator(base_url: &str) -> Authenticator {
    let backend = HttpBackend::new(&AppConfig::new(base_url)).unwrap();
    Authenticator::restored(Arc::new(backend), Arc::new(MemoryStore::new()))
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

#[tokio::test]
async fn otp_flow_over_http() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);

    let outcome = authenticator
        .login(ADMIN_EMAIL, &secret(ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(outcome, LoginOutcome::OtpRequired);

    let wrong = authenticator.verify_otp("999999").await;
    assert_eq!(
        wrong,
        Err(AuthError::InvalidOtp("That code is not valid".to_string()))
    );

    let user = authenticator.verify_otp("123456").await.unwrap();
    assert_eq!(user.email, ADMIN_EMAIL);
    assert!(authenticator.is_authenticated());
}

#[tokio::test]
async fn login_without_otp_challenge_signs_in_directly() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);

    let outcome = authenticator
        .login(DIRECT_EMAIL, &secret(DIRECT_PASSWORD))
        .await
        .unwrap();
    let LoginOutcome::Authenticated(user) = outcome else {
        panic!("expected a direct session");
    };
    assert_eq!(user.email, DIRECT_EMAIL);
    assert_eq!(authenticator.state(), SessionState::Authenticated(user));
}

#[tokio::test]
async fn rejected_login_carries_server_message() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);

    let result = authenticator.login(ADMIN_EMAIL, &secret("nope")).await;
    assert_eq!(
        result,
        Err(AuthError::InvalidCredentials(
            "Email or password is incorrect".to_string()
        ))
    );

    let crashed = authenticator.login("crash@mcc.edu.in", &secret("x")).await;
    assert!(matches!(crashed, Err(AuthError::RequestFailed(_))));

    let malformed = authenticator.login("broken@mcc.edu.in", &secret("x")).await;
    assert!(matches!(malformed, Err(AuthError::RequestFailed(_))));

    assert_eq!(authenticator.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn forgot_password_hides_unknown_addresses() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);

    assert_eq!(authenticator.forgot_password(ADMIN_EMAIL).await, Ok(()));
    assert_eq!(
        authenticator.forgot_password("stranger@mcc.edu.in").await,
        Ok(())
    );
}

#[tokio::test]
async fn reset_password_maps_rejections() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);
    let password = secret("NewPass@123");

    assert_eq!(authenticator.validate_reset_token("good").await, Ok(()));
    assert_eq!(
        authenticator
            .reset_password("good", &password, &password)
            .await,
        Ok(())
    );

    assert_eq!(
        authenticator.validate_reset_token("stale").await,
        Err(AuthError::InvalidOrExpiredToken(
            "Reset link expired".to_string()
        ))
    );
    assert!(matches!(
        authenticator
            .reset_password("stale", &password, &password)
            .await,
        Err(AuthError::InvalidOrExpiredToken(_))
    ));
    assert_eq!(
        authenticator
            .reset_password("weak", &password, &password)
            .await,
        Err(AuthError::PasswordTooWeak(
            "Password is too common".to_string()
        ))
    );
    assert!(matches!(
        authenticator
            .reset_password("boom", &password, &password)
            .await,
        Err(AuthError::RequestFailed(_))
    ));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = AppConfig::new(&format!("http://{addr}/api"))
        .with_request_timeout(Duration::from_secs(2));
    let backend = HttpBackend::new(&config).unwrap();
    let authenticator = Authenticator::restored(Arc::new(backend), Arc::new(MemoryStore::new()));

    let result = authenticator
        .login(ADMIN_EMAIL, &secret(ADMIN_PASSWORD))
        .await;
    assert!(matches!(result, Err(AuthError::NetworkError { .. })));
    assert_eq!(authenticator.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn content_client_sends_session_token() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);
    authenticator
        .login(DIRECT_EMAIL, &secret(DIRECT_PASSWORD))
        .await
        .unwrap();

    let config = AppConfig::new(&base_url);
    let client = ContentClient::new(&config, authenticator.bearer_token()).unwrap();
    let notices = client.list(Resource::Notices).await.unwrap();
    assert_eq!(notices[0]["title"], "Admissions open");

    client.delete(Resource::Notices, "1").await.unwrap();
    let missing = client.delete(Resource::Notices, "2").await;
    assert!(matches!(missing, Err(AppError::Http { status: 404, .. })));

    let anonymous = ContentClient::new(&config, None).unwrap();
    let denied = anonymous.list(Resource::Notices).await;
    assert!(matches!(denied, Err(AppError::Http { status: 401, .. })));
}

#[tokio::test]
async fn media_upload_is_multipart() {
    let base_url = spawn_portal().await;
    let authenticator = authenticator(&base_url);
    authenticator
        .login(DIRECT_EMAIL, &secret(DIRECT_PASSWORD))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("prospectus.pdf");
    std::fs::write(&file, b"%PDF-1.4 prospectus").unwrap();

    let client =
        ContentClient::new(&AppConfig::new(&base_url), authenticator.bearer_token()).unwrap();
    let response = client.upload_media(&file).await.unwrap();
    assert_eq!(response["uploaded"][0]["field"], "file");
    assert_eq!(response["uploaded"][0]["fileName"], "prospectus.pdf");
    assert_eq!(response["uploaded"][0]["size"], 19);
}
