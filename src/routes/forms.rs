use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::guard::fingerprint::{self, ClientProfile};
use crate::guard::{CheckKind, Rejection};
use crate::state::SharedState;
use crate::store::ScopedStore;
use crate::submission::{metadata, parser};

const MAX_FORM_ID_LEN: usize = 128;

fn check_form_id(form_id: &str) -> Result<(), AppError> {
    let ok = !form_id.is_empty()
        && form_id.len() <= MAX_FORM_ID_LEN
        && form_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid form id".to_string()))
    }
}

fn client_scope(state: &SharedState, headers: &HeaderMap, addr: SocketAddr) -> String {
    metadata::client_ip(headers, Some(addr.ip()), &state.config.trusted_proxies).to_string()
}

/// Mark a form as interactive for the calling client.
pub async fn begin_session(
    State(state): State<SharedState>,
    Path(form_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    check_form_id(&form_id)?;

    let reported: ClientProfile = if body.is_empty() {
        ClientProfile::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid client profile: {e}")))?
    };
    let profile = metadata::profile_from_headers(&headers, reported);

    let client = client_scope(&state, &headers, addr);
    let lock = state.client_lock(&client);
    let _serial = lock.lock().await;

    let store = ScopedStore::new(state.store.as_ref(), &client);
    let loaded_at = {
        let sessions = state.sessions.entry(client.clone()).or_default();
        state.guard.begin_session(&sessions, &store, &form_id)
    };

    let fingerprint = fingerprint::fingerprint(&profile);
    state.profiles.insert(client, profile);

    Ok((
        StatusCode::OK,
        Json(json!({
            "form_id": form_id,
            "loaded_at": loaded_at,
            "fingerprint": fingerprint,
        })),
    )
        .into_response())
}

pub async fn submit(
    State(state): State<SharedState>,
    Path(form_id): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    check_form_id(&form_id)?;

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    let fields = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body).await
    } else {
        parser::parse_body(content_type, &body)
    }
    .map_err(AppError::BadRequest)?;

    let client = client_scope(&state, &headers, addr);

    // Held until the ledger is recorded
    let lock = state.client_lock(&client);
    let _serial = lock.lock().await;

    let store = ScopedStore::new(state.store.as_ref(), &client);
    let honeypot = fields
        .get(&state.guard.config().honeypot_field)
        .map(String::as_str);

    let result = {
        let sessions = state.sessions.entry(client.clone()).or_default();
        state
            .guard
            .validate(&sessions, &store, &fields, honeypot, &form_id)
    };

    if !result.valid {
        let check = result.check.unwrap_or(CheckKind::Input);
        if result.is_bot == Some(true) {
            tracing::warn!(
                "Bot submission on form {form_id} from {client} ({check}), user agent: {}",
                metadata::user_agent(&headers)
            );
        } else {
            tracing::debug!("Rejected submission on form {form_id} from {client} ({check})");
        }

        return match result.error {
            // Silent 200 for bots
            Some(Rejection::Silent) | None => {
                Ok((StatusCode::OK, Json(json!({"status": "ok"}))).into_response())
            }
            Some(Rejection::Explained(message)) if check == CheckKind::RateLimit => {
                Err(AppError::RateLimited(message))
            }
            Some(Rejection::Explained(message)) => Err(AppError::Rejected { check, message }),
        };
    }

    let profile = state
        .profiles
        .get(&client)
        .map(|p| p.value().clone())
        .unwrap_or_default();
    let prepared = state
        .guard
        .prepare_for_transmission(&fields, profile.timezone.as_deref());

    let submission_id = Uuid::now_v7();
    if let Some(relay) = &state.relay {
        relay
            .deliver(submission_id, &form_id, &prepared)
            .await
            .map_err(AppError::BadGateway)?;
    }

    state.guard.record_submission(&store);
    {
        let sessions = state.sessions.entry(client.clone()).or_default();
        state.guard.begin_session(&sessions, &store, &form_id);
    }

    tracing::info!("Accepted submission {submission_id} on form {form_id}");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "created",
            "submission_id": submission_id,
            "fingerprint": fingerprint::fingerprint(&profile),
        })),
    )
        .into_response())
}

pub async fn submit_options() -> Response {
    (
        [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type"),
            ("Access-Control-Max-Age", "86400"),
        ],
        StatusCode::NO_CONTENT,
    )
        .into_response()
}
