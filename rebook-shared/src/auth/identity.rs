/// Email/password identity provider
///
/// Passwords are never stored here; they are checked by an external
/// identity provider. [`FirebaseIdentity`] speaks the Identity Toolkit REST
/// API (`accounts:signInWithPassword`, `accounts:signUp`); [`MemoryIdentity`]
/// keeps accounts in process for tests and local runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Minimum password length the provider accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A verified user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    /// Provider user id; doubles as the salon id
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailExists,

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError>;
}

pub type DynIdentityProvider = Arc<dyn IdentityProvider>;

/// Identity Toolkit client settings
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Web API key of the project
    pub api_key: String,

    /// Service root, without a trailing slash
    pub base_url: String,

    pub timeout: Duration,
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://identitytoolkit.googleapis.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps an Identity Toolkit error code onto [`IdentityError`]
///
/// Codes look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be ...`.
fn map_error_code(message: &str) -> IdentityError {
    let code = message.split(':').next().unwrap_or_default().trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            IdentityError::InvalidCredentials
        }
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "WEAK_PASSWORD" => IdentityError::WeakPassword(
            message
                .split_once(':')
                .map(|(_, detail)| detail.trim().to_string())
                .unwrap_or_else(|| format!("at least {MIN_PASSWORD_LENGTH} characters required")),
        ),
        _ => IdentityError::Rejected(message.to_string()),
    }
}

/// [`IdentityProvider`] backed by the Identity Toolkit REST API
#[derive(Clone)]
pub struct FirebaseIdentity {
    http: reqwest::Client,
    config: FirebaseConfig,
}

impl FirebaseIdentity {
    pub fn new(config: FirebaseConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn call(&self, method: &str, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        let url = format!(
            "{}/v1/accounts:{}",
            self.config.base_url.trim_end_matches('/'),
            method
        );
        debug!(method, "Calling identity provider");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let account: AccountResponse = response.json().await?;
            return Ok(IdentityUser {
                uid: account.local_id,
                email: account.email,
            });
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(map_error_code(&envelope.error.message)),
            Err(_) => {
                warn!(status = status.as_u16(), "Unexpected identity provider response");
                Err(IdentityError::Rejected(format!("HTTP {}", status.as_u16())))
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        self.call("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        self.call("signUp", email, password).await
    }
}

/// In-process accounts keyed by lowercase email
#[derive(Clone, Default)]
pub struct MemoryIdentity {
    accounts: Arc<Mutex<HashMap<String, (String, String)>>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        let key = email.to_lowercase();
        match self.accounts.lock().await.get(&key) {
            Some((uid, stored)) if stored == password => Ok(IdentityUser {
                uid: uid.clone(),
                email: key,
            }),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword(format!(
                "at least {MIN_PASSWORD_LENGTH} characters required"
            )));
        }

        let key = email.to_lowercase();
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&key) {
            return Err(IdentityError::EmailExists);
        }

        let uid = Uuid::new_v4().simple().to_string();
        accounts.insert(key.clone(), (uid.clone(), password.to_string()));
        Ok(IdentityUser { uid, email: key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, http::Uri, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_map_error_code() {
        assert!(matches!(map_error_code("EMAIL_EXISTS"), IdentityError::EmailExists));
        assert!(matches!(
            map_error_code("INVALID_LOGIN_CREDENTIALS"),
            IdentityError::InvalidCredentials
        ));
        match map_error_code("WEAK_PASSWORD : Password should be at least 6 characters") {
            IdentityError::WeakPassword(detail) => {
                assert_eq!(detail, "Password should be at least 6 characters")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(map_error_code("QUOTA_EXCEEDED"), IdentityError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_memory_identity() {
        let identity = MemoryIdentity::new();

        let user = identity.sign_up("Owner@Glow.example", "secret1").await.unwrap();
        assert_eq!(user.email, "owner@glow.example");

        let again = identity.sign_in("owner@glow.example", "secret1").await.unwrap();
        assert_eq!(again.uid, user.uid);

        assert!(matches!(
            identity.sign_in("owner@glow.example", "wrong!").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            identity.sign_up("owner@glow.example", "secret1").await,
            Err(IdentityError::EmailExists)
        ));
        assert!(matches!(
            identity.sign_up("new@glow.example", "123").await,
            Err(IdentityError::WeakPassword(_))
        ));
    }

    async fn accounts(
        uri: Uri,
        Query(params): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if uri.path() != "/v1/accounts:signInWithPassword" {
            return (StatusCode::NOT_FOUND, Json(json!({})));
        }
        if params.get("key").map(String::as_str) != Some("test-key") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "message": "API_KEY_INVALID" } })),
            );
        }
        if body["password"] == "letmein" {
            (
                StatusCode::OK,
                Json(json!({ "localId": "uid-42", "email": body["email"], "idToken": "x" })),
            )
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "message": "INVALID_LOGIN_CREDENTIALS" } })),
            )
        }
    }

    async fn spawn_identity_toolkit() -> String {
        // ':' in the method suffix would be read as a path capture, so match in the handler
        let app = Router::new().fallback(accounts);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_firebase_sign_in() {
        let base_url = spawn_identity_toolkit().await;
        let identity = FirebaseIdentity::new(FirebaseConfig {
            base_url,
            ..FirebaseConfig::new("test-key")
        })
        .unwrap();

        let user = identity.sign_in("owner@glow.example", "letmein").await.unwrap();
        assert_eq!(user.uid, "uid-42");
        assert_eq!(user.email, "owner@glow.example");

        assert!(matches!(
            identity.sign_in("owner@glow.example", "nope").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }
}
