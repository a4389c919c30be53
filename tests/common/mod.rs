#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode as AxumStatus;
use axum::routing::post;
use axum::{Json, Router};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use formguard::clock::ManualClock;
use formguard::config::{Config, RelayConfig, SecurityConfig};
use formguard::state::SharedState;
use formguard::store::MemoryStore;

pub const START_MILLIS: i64 = 1_700_000_000_000;

/// A running test server instance with a controllable clock and in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Begin a form session, optionally reporting a client profile.
    pub async fn begin(&self, form_id: &str, profile: Option<Value>) -> (Value, StatusCode) {
        let mut req = self
            .client
            .post(self.url(&format!("/v1/forms/{form_id}/session")));
        if let Some(profile) = profile {
            req = req.json(&profile);
        }
        let resp = req.send().await.expect("begin session request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit JSON fields to a form, return (body, status).
    pub async fn submit_json(&self, form_id: &str, data: &Value) -> (Value, StatusCode) {
        self.submit_json_as(form_id, data, None).await
    }

    /// Submit JSON fields, claiming to be forwarded for `forwarded_for`.
    pub async fn submit_json_as(
        &self,
        form_id: &str,
        data: &Value,
        forwarded_for: Option<&str>,
    ) -> (Value, StatusCode) {
        let mut req = self
            .client
            .post(self.url(&format!("/v1/forms/{form_id}/submit")))
            .json(data);
        if let Some(ip) = forwarded_for {
            req = req.header("x-forwarded-for", ip);
        }
        let resp = req.send().await.expect("submit json failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Submit form-urlencoded data to a form, return (body, status).
    pub async fn submit_form(&self, form_id: &str, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(&format!("/v1/forms/{form_id}/submit")))
            .form(data)
            .send()
            .await
            .expect("submit form failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 65_536,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        store_path: None,
        cleanup_interval_secs: 300,
        relay: None,
        security: SecurityConfig::default(),
    }
}

pub fn relay_config(url: &str) -> RelayConfig {
    RelayConfig {
        url: url.to_string(),
        max_retries: 2,
        backoff_ms: 10,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let store = Arc::new(MemoryStore::new());

    let (app, state) = formguard::build_app(config, store.clone(), clock.clone())
        .expect("Failed to build app");

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        clock,
        store,
        state,
    }
}

/// A fake downstream endpoint that records every body it receives.
pub struct Downstream {
    pub url: String,
    pub received: Arc<Mutex<Vec<Value>>>,
}

type DownstreamState = (Arc<Mutex<Vec<Value>>>, AxumStatus, Duration);

async fn record(
    State((received, status, delay)): State<DownstreamState>,
    Json(body): Json<Value>,
) -> AxumStatus {
    tokio::time::sleep(delay).await;
    received.lock().unwrap().push(body);
    status
}

pub async fn spawn_downstream(status: AxumStatus) -> Downstream {
    spawn_slow_downstream(status, Duration::ZERO).await
}

/// A downstream that waits `delay` before answering each delivery.
pub async fn spawn_slow_downstream(status: AxumStatus, delay: Duration) -> Downstream {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/hook", post(record))
        .with_state((received.clone(), status, delay));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind downstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Downstream failed");
    });

    Downstream {
        url: format!("http://{addr}/hook"),
        received,
    }
}

/// Fields that pass every content check.
pub fn valid_fields() -> Value {
    json!({
        "name": "Jane Cooper",
        "email": "jane@example.com",
        "subject": "Question about your article",
        "message": "Hello, I wanted to reach out about your privacy policy.",
    })
}
