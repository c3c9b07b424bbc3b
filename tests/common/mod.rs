//! Shared harness for HTTP-level integration tests.
//!
//! Every [`TestApp`] owns a fresh in-memory SQLite database with the schema
//! applied, a running event loop and the full application router.

#![allow(dead_code)]

use std::sync::Arc;

use accessory_shop_api::{
    auth::{AuthConfig, AuthService, Claims},
    build_router,
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventSender},
    AppState,
};
use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde_json::{json, Value};
use tokio::{sync::mpsc, task::JoinHandle};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-with-enough-entropy-0123456789";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    event_task: JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("connect to in-memory sqlite");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            JWT_SECRET.to_string(),
            None,
            None,
        )));
        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));
        let router = build_router(state.clone(), auth_service);

        Self {
            router,
            state,
            event_task,
        }
    }

    /// Bearer token for a regular customer.
    pub fn customer_token(&self, user_id: &str) -> String {
        mint_token(user_id, &[])
    }

    /// Bearer token carrying the `staff` role.
    pub fn staff_token(&self) -> String {
        mint_token("staff-1", &["staff"])
    }

    /// Sends a request and returns the status plus the decoded JSON body
    /// (`Value::Null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json response")
        };
        (status, value)
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> i64 {
        let row = self
            .state
            .db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                format!("SELECT COUNT(*) AS n FROM {table}"),
            ))
            .await
            .expect("count query")
            .expect("count row");
        row.try_get("", "n").expect("count column")
    }

    /// Runs a raw statement against the test database.
    pub async fn execute_sql(&self, sql: &str) {
        self.state
            .db
            .execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
            .await
            .expect("raw statement");
    }

    /// Creates a product through the staff API and returns its id.
    pub async fn seed_product(&self, name: &str, price: &str, discounted: Option<&str>) -> Uuid {
        let staff = self.staff_token();
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/products",
                Some(json!({
                    "name": name,
                    "price": price,
                    "discounted_price": discounted,
                })),
                Some(&staff),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed product failed: {body}");
        body["data"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("product id in response")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

pub fn mint_token(user_id: &str, roles: &[&str]) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        name: Some(format!("User {user_id}")),
        email: Some(format!("{user_id}@example.com")),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::hours(1)).timestamp(),
        iss: None,
        aud: None,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode access token")
}

/// Reads a decimal field that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected decimal, got {other}"),
    }
}

pub fn shipping_address() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "street_address": "12 Analytical Row",
        "apartment_address": null,
        "postal_code": "10115",
        "city": "Berlin",
        "country": "DE"
    })
}
