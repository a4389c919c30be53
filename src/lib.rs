pub mod clock;
pub mod config;
pub mod error;
pub mod guard;
pub mod inject;
pub mod relay;
pub mod routes;
pub mod state;
pub mod store;
pub mod submission;
pub mod sweeper;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use dashmap::DashMap;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::config::Config;
use crate::guard::FormGuard;
use crate::relay::Relay;
use crate::state::{AppState, SharedState};
use crate::store::KeyValueStore;

pub fn build_app(
    config: Config,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
) -> Result<(Router, SharedState), String> {
    let guard = FormGuard::new(config.security.clone(), clock)?;

    let relay = match &config.relay {
        Some(relay_config) => {
            tracing::info!("Relaying accepted submissions to {}", relay_config.url);
            Some(Relay::new(relay_config)?)
        }
        None => {
            tracing::info!("No relay configured, accepted submissions are only recorded");
            None
        }
    };

    let max_body_size = config.max_body_size;
    let state: SharedState = Arc::new(AppState {
        config,
        guard,
        sessions: DashMap::new(),
        store,
        relay,
        profiles: DashMap::new(),
        client_locks: DashMap::new(),
    });

    let app = Router::new()
        .merge(routes::form_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> &'static str {
    "ok"
}
