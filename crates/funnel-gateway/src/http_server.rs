//! HTTP Front-End
//!
//! The axum router of the sidecar. Every request outside `/healthz`, any
//! method, is shaped into an envelope, delegated to the pool, and the resulting
//! message is written back per the Accept header. Requests the shaper
//! rejects short-circuit into an `InputError` message without consulting
//! the dispatcher. `/healthz` reflects the pool's health signal.

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use funnel_common::codec::CodecRegistry;
use funnel_common::protocol::Message;
use funnel_pool::Dispatcher;

use crate::injector::RequestMeta;
use crate::shaper::RequestShaper;

/// Maximum request body size (10 MB).
///
/// Requests beyond this are rejected before allocation to keep oversized
/// payloads from exhausting memory.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub shaper: Arc<RequestShaper>,
    pub codecs: Arc<CodecRegistry>,
}

/// Builds the sidecar's router. Everything except `/healthz` is an
/// invocation, whatever the method or path.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handle_healthz))
        .fallback(handle_invoke)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_invoke(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let meta = RequestMeta::from_parts(&parts);
    let accept = meta.accept().unwrap_or_default().to_string();

    let message = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => match state.shaper.shape(&meta, &bytes) {
            Ok(envelope) => state.dispatcher.delegate(&envelope).await,
            Err(err) => Message::input_error(format!("Invalid Input: {err}")),
        },
        Err(err) => Message::input_error(format!("Invalid Input: {err}")),
    };

    write_message(&state.codecs, &accept, &message)
}

/// Encodes the message per the Accept header. The message always travels
/// with status 200; its context carries the classification.
fn write_message(codecs: &CodecRegistry, accept: &str, message: &Message) -> Response {
    match codecs.write(accept, message) {
        Ok((content_type, body)) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(_) => (
            StatusCode::OK,
            format!("Unsupported Accept type: {accept}"),
        )
            .into_response(),
    }
}

async fn handle_healthz(State(state): State<AppState>) -> Response {
    if state.dispatcher.health().is_healthy() {
        (StatusCode::OK, "{}").into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "{}").into_response()
    }
}
