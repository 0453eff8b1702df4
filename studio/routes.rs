use std::io::Cursor;

use climate_nn::EngineError;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use crate::handlers;
use crate::state::SharedState;

pub type JsonResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub fn json_response(status: u16, body: &Value) -> JsonResponse {
    let bytes = body.to_string().into_bytes();
    let len = bytes.len();
    let headers = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .into_iter()
        .collect();
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}

pub fn ok(body: Value) -> JsonResponse {
    json_response(200, &body)
}

pub fn error_response(status: u16, message: impl Into<String>) -> JsonResponse {
    json_response(status, &json!({ "error": message.into() }))
}

/// Maps an engine error to a status code: state conflicts are 409,
/// everything else is a bad request.
pub fn engine_error(err: EngineError) -> JsonResponse {
    warn!(error = %err, "request rejected");
    let status = match err {
        EngineError::InvalidState { .. } => 409,
        _ => 400,
    };
    error_response(status, err.to_string())
}

pub fn not_found() -> JsonResponse {
    error_response(404, "not found")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Reads and deserializes a JSON body. An empty body deserializes as `{}`.
pub fn read_json<T: DeserializeOwned>(request: &mut Request) -> Result<T, JsonResponse> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        return Err(error_response(400, format!("could not read body: {}", e)));
    }
    let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| error_response(400, format!("invalid JSON body: {}", e)))
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// All handlers except SSE receive a `&mut Request` (or nothing) so the
/// dispatcher can call `request.respond(response)` at the end. The SSE handler
/// takes ownership to perform long-lived streaming.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();

    let (path, query) = match url.find('?') {
        Some(pos) => (url[..pos].to_owned(), url[pos + 1..].to_owned()),
        None      => (url.clone(), String::new()),
    };
    debug!(%method, %path, "request");

    // SSE: long-lived; handler takes ownership and drives the stream loop.
    if method == Method::Get && path == "/api/train/events" {
        handlers::train_sse::handle(request, state);
        return;
    }

    let response = match (method, path.as_str()) {
        // ── Engine ───────────────────────────────────────────────────────
        (Method::Get,  "/api/state")    => handlers::engine::handle_state(state),
        (Method::Post, "/api/settings") => handlers::engine::handle_settings(&mut request, state),
        (Method::Post, "/api/forward")  => handlers::engine::handle_forward(state),
        (Method::Post, "/api/step")     => handlers::engine::handle_step(state),
        (Method::Post, "/api/reset")    => handlers::engine::handle_reset(state),

        // ── Train ────────────────────────────────────────────────────────
        (Method::Post, "/api/train/start") => handlers::train::handle_start(&mut request, state),
        (Method::Post, "/api/train/stop")  => handlers::train::handle_stop(state),

        // ── Catalog ──────────────────────────────────────────────────────
        (Method::Get, "/api/activations") => handlers::activation::handle_catalog(),
        (Method::Get, "/api/activation")  => handlers::activation::handle_evaluate(&query),
        (Method::Get, "/api/scenarios")   => handlers::engine::handle_scenarios(),

        // ── 404 ──────────────────────────────────────────────────────────
        _ => not_found(),
    };

    let _ = request.respond(response);
}
