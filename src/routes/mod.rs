pub mod forms;

use axum::routing::post;
use axum::Router;

use crate::state::SharedState;

pub fn form_routes() -> Router<SharedState> {
    Router::new()
        .route("/v1/forms/{form_id}/session", post(forms::begin_session))
        .route(
            "/v1/forms/{form_id}/submit",
            post(forms::submit).options(forms::submit_options),
        )
}
