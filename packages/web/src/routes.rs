//! HTTP routes. Each handler reads the cookie session into a
//! [`SessionContext`], calls one manager operation and answers with JSON of the
//! shape `{ "success": bool, ... }`.

use std::sync::Arc;

use api::auth::{SESSION_USERNAME_KEY, SESSION_USER_ID_KEY};
use api::vault::DEFAULT_BLUR_LEVEL;
use api::{AccountError, AccountManager, CreateSecret, SecretVault, SessionContext, VaultError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use store::{User, VaultStore};
use tower_sessions::Session;

/// Shared handler state.
pub struct AppState<S> {
    pub accounts: Arc<AccountManager<S>>,
    pub vault: Arc<SecretVault<S>>,
}

impl<S> AppState<S> {
    pub fn new(accounts: AccountManager<S>, vault: SecretVault<S>) -> Self {
        Self {
            accounts: Arc::new(accounts),
            vault: Arc::new(vault),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            vault: self.vault.clone(),
        }
    }
}

pub fn router<S: VaultStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/register", post(register::<S>))
        .route("/login", post(login::<S>))
        .route("/logout", get(logout))
        .route("/dashboard", get(dashboard::<S>))
        .route("/create", post(create_secret::<S>))
        .route("/view/{unique_id}", get(view_secret::<S>).post(unlock_secret::<S>))
        .route("/secrets/{unique_id}/delete", post(delete_secret::<S>))
        .route("/api/auth/check", get(check_auth::<S>))
        .with_state(state)
}

/// Handler failure, rendered as `{ "success": false, "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    Account(AccountError),
    Vault(VaultError),
    Session(tower_sessions::session::Error),
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        ApiError::Account(e)
    }
}

impl From<VaultError> for ApiError {
    fn from(e: VaultError) -> Self {
        ApiError::Vault(e)
    }
}

impl From<tower_sessions::session::Error> for ApiError {
    fn from(e: tower_sessions::session::Error) -> Self {
        ApiError::Session(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Account(e) => match e {
                AccountError::Duplicate => StatusCode::CONFLICT,
                AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AccountError::Validation(_) => StatusCode::BAD_REQUEST,
                AccountError::Hashing(_) | AccountError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Vault(e) => match e {
                VaultError::NotFound => StatusCode::NOT_FOUND,
                VaultError::Expired => StatusCode::GONE,
                VaultError::WrongPassword | VaultError::Unauthenticated => StatusCode::UNAUTHORIZED,
                VaultError::Validation(_) => StatusCode::BAD_REQUEST,
                VaultError::IdSpaceExhausted | VaultError::Hashing(_) | VaultError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
            "Internal server error".to_string()
        } else {
            match &self {
                ApiError::Account(e) => e.to_string(),
                ApiError::Vault(e) => e.to_string(),
                ApiError::Session(e) => e.to_string(),
            }
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

async fn session_context(session: &Session) -> Result<SessionContext, ApiError> {
    let user_id: Option<i64> = session.get(SESSION_USER_ID_KEY).await?;
    let username: Option<String> = session.get(SESSION_USERNAME_KEY).await?;
    Ok(SessionContext { user_id, username })
}

async fn log_in(session: &Session, user: &User) -> Result<(), ApiError> {
    // Fresh session id on every login.
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID_KEY, user.id).await?;
    session.insert(SESSION_USERNAME_KEY, &user.username).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn register<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .accounts
        .register(&form.username, &form.email, &form.password)
        .await?;
    log_in(&session, &user).await?;
    Ok(Json(json!({ "success": true, "user": user.to_info() })))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .accounts
        .authenticate(&form.username, &form.password)
        .await?;
    log_in(&session, &user).await?;
    Ok(Json(json!({ "success": true, "user": user.to_info() })))
}

async fn logout(session: Session) -> Result<Json<Value>, ApiError> {
    session.flush().await?;
    Ok(Json(json!({ "success": true })))
}

async fn dashboard<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    session: Session,
) -> Result<Json<Value>, ApiError> {
    let context = session_context(&session).await?;
    let secrets = state.vault.list(&context).await?;
    Ok(Json(json!({
        "success": true,
        "username": context.username,
        "secrets": secrets,
    })))
}

#[derive(Debug, Deserialize)]
struct CreateForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    password: String,
    blur_level: Option<String>,
    expiration: Option<String>,
}

/// Missing or blank means the default blur.
fn parse_blur_level(raw: Option<&str>) -> Result<i32, VaultError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_BLUR_LEVEL),
        Some(value) => value
            .parse()
            .map_err(|_| VaultError::Validation("Blur level must be a whole number".to_string())),
    }
}

/// Unparsable input means no expiry.
fn parse_ttl_hours(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

async fn create_secret<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    session: Session,
    Form(form): Form<CreateForm>,
) -> Result<Json<Value>, ApiError> {
    let context = session_context(&session).await?;
    let request = CreateSecret {
        blur_level: parse_blur_level(form.blur_level.as_deref())?,
        ttl_hours: parse_ttl_hours(form.expiration.as_deref()),
        title: form.title,
        content: form.content,
        password: form.password,
    };
    let created = state.vault.create(&context, request).await?;
    Ok(Json(json!({ "success": true, "secret": created })))
}

async fn view_secret<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    Path(unique_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let view = state.vault.view(&unique_id, None).await?;
    Ok(Json(json!({ "success": true, "secret": view })))
}

#[derive(Debug, Deserialize)]
struct UnlockForm {
    #[serde(default)]
    password: String,
}

async fn unlock_secret<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    Path(unique_id): Path<String>,
    Form(form): Form<UnlockForm>,
) -> Result<Json<Value>, ApiError> {
    let view = state.vault.view(&unique_id, Some(&form.password)).await?;
    Ok(Json(json!({ "success": true, "secret": view })))
}

async fn delete_secret<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    session: Session,
    Path(unique_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let context = session_context(&session).await?;
    state.vault.delete(&context, &unique_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn check_auth<S: VaultStore + 'static>(
    State(state): State<AppState<S>>,
    session: Session,
) -> Result<Json<Value>, ApiError> {
    let context = session_context(&session).await?;
    if let Some(user_id) = context.user_id() {
        if let Some(user) = state.accounts.get(user_id).await? {
            return Ok(Json(json!({ "success": true, "user": user.to_info() })));
        }
    }
    Ok(Json(json!({ "success": false, "error": "Not logged in" })))
}
