#![allow(dead_code)]

/// Shared fixtures for API integration tests
///
/// Every test gets a fresh in-memory store, a mock messenger and an
/// in-memory identity provider, plus a signed-in salon with a valid token.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use rebook_api::app::{build_router, AppState};
use rebook_api::config::Config;
use rebook_shared::auth::identity::MemoryIdentity;
use rebook_shared::auth::jwt;
use rebook_shared::models::salon::{NewSalon, UpdateSalon};
use rebook_shared::store::{MemoryStore, Store};
use rebook_shared::whatsapp::mock::MockMessenger;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const SALON_ID: &str = "salon-uid-1";
pub const OTHER_SALON_ID: &str = "salon-uid-2";
pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_config() -> Config {
    Config::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "postgresql://localhost/rebook_test",
            "JWT_SECRET" => JWT_SECRET,
            "IDENTITY_API_KEY" => "test-api-key",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config is valid")
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub messenger: MockMessenger,
    pub state: AppState,
    pub app: Router,
    pub token: String,
    pub other_token: String,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let messenger = MockMessenger::new();
        let identity = Arc::new(MemoryIdentity::new());

        for (id, email) in [(SALON_ID, "owner@glow.example"), (OTHER_SALON_ID, "owner@other.example")] {
            store
                .create_salon_if_absent(NewSalon {
                    id: id.to_string(),
                    email: email.to_string(),
                    salon_name: Some("Glow Studio".to_string()),
                })
                .await
                .unwrap();
        }

        let state = AppState::new(
            store.clone(),
            Arc::new(messenger.clone()),
            identity,
            test_config(),
        );
        let app = build_router(state.clone());

        let token = jwt::issue_tokens(SALON_ID, SALON_ID, JWT_SECRET)
            .unwrap()
            .access_token;
        let other_token = jwt::issue_tokens(OTHER_SALON_ID, OTHER_SALON_ID, JWT_SECRET)
            .unwrap()
            .access_token;

        Self {
            store,
            messenger,
            state,
            app,
            token,
            other_token,
        }
    }

    /// Gives the default salon working WhatsApp credentials
    pub async fn configure_whatsapp(&self) {
        self.store
            .update_salon(
                SALON_ID,
                UpdateSalon {
                    whatsapp_access_token: Some("EAAG-test-token".to_string()),
                    whatsapp_phone_number_id: Some("1098765".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    /// Sends a request, returning the status and the JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// Authenticated request as the default salon
    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, Some(&self.token), body).await
    }

    pub async fn create_customer(&self, name: &str, phone: &str, service: &str, days_ago: i64) -> Value {
        let last_visit = (Utc::now() - Duration::days(days_ago))
            .format("%Y-%m-%d")
            .to_string();

        let (status, body) = self
            .call(
                "POST",
                "/v1/customers",
                Some(json!({
                    "name": name,
                    "phone": phone,
                    "services": [service],
                    "last_visit": last_visit,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create customer failed: {body}");
        body
    }

    pub async fn create_template(&self, content: &str) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/v1/templates",
                Some(json!({ "name": "Follow-up", "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create template failed: {body}");
        body
    }

    pub async fn create_campaign(&self, template_id: &str, service_filter: Option<&str>, days: i32) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/v1/campaigns",
                Some(json!({
                    "name": "Win-back",
                    "template_id": template_id,
                    "service_filter": service_filter,
                    "days_since_visit": days,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create campaign failed: {body}");
        body
    }
}
