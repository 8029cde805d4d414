//! HTTP control surface: wires [`VadController`]'s public operations to a
//! small JSON API. Routing only — all real work happens in the controller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::VadOptionsUpdate;
use crate::controller::{VadController, VadStatus};
use crate::error::VadError;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<VadController>,
}

/// Build the router for the control plane, per the documented surface:
/// `GET /api/v1/vad/status`, `POST .../start`, `POST .../stop`,
/// `GET .../options`, `PATCH .../options`.
pub fn router(controller: Arc<VadController>) -> Router {
    Router::new()
        .route("/api/v1/vad/status", get(get_status))
        .route("/api/v1/vad/start", post(post_start))
        .route("/api/v1/vad/stop", post(post_stop))
        .route("/api/v1/vad/options", get(get_options).patch(patch_options))
        .with_state(AppState { controller })
}

#[derive(Serialize)]
struct OkStatus {
    ok: bool,
    status: VadStatus,
}

#[derive(Serialize)]
struct OkBody {
    ok: bool,
}

#[derive(Serialize)]
struct ErrBody {
    ok: bool,
    error: String,
}

fn err_response(e: VadError) -> (StatusCode, Json<ErrBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrBody {
            ok: false,
            error: e.to_string(),
        }),
    )
}

async fn get_status(State(state): State<AppState>) -> Json<VadStatus> {
    Json(state.controller.status())
}

/// Start accepts an optional partial config object in the body. An empty (or
/// absent) body means "start with the current options unchanged"; axum's
/// `Json` extractor rejects an empty body outright, so the body is read as
/// raw text and parsed by hand.
async fn post_start(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let update = if body.trim().is_empty() {
        None
    } else {
        match serde_json::from_str::<VadOptionsUpdate>(&body) {
            Ok(update) => Some(update),
            Err(e) => {
                return err_response(VadError::MicUnavailable(format!(
                    "malformed start body: {}",
                    e
                )))
                .into_response()
            }
        }
    };

    match state.controller.start(update).await {
        Ok(status) => Json(OkStatus { ok: true, status }).into_response(),
        Err(e) => err_response(e).into_response(),
    }
}

async fn post_stop(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.controller.stop().await;
    Json(OkStatus { ok: true, status })
}

async fn get_options(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::to_value(state.controller.options_snapshot()).expect("VadOptions always serializes"))
}

/// Takes the body as raw text and parses it by hand, matching
/// `post_start`: the `Json` extractor would reject a malformed or
/// type-mismatched body before this handler runs, with its own `400`/`422`
/// envelopes instead of the `{ok:false, error}`/400 contract spec.md §6
/// documents for every failure path here.
async fn patch_options(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let update: VadOptionsUpdate = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            return err_response(VadError::MicUnavailable(format!(
                "malformed options body: {}",
                e
            )))
            .into_response()
        }
    };

    match state.controller.update(update) {
        Ok(()) => Json(OkBody { ok: true }).into_response(),
        Err(e) => err_response(e).into_response(),
    }
}
