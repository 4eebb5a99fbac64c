//! The chat endpoint: `POST /` answers, `GET /` reports health, `OPTIONS /` is a bare
//! preflight. Every response carries permissive CORS headers.

pub mod envelope;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::{Json, Router};
use envelope::{ApiError, ChatReply, StatusReport};
use serde::Deserialize;
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use webreply_core::{Answerer, Clock, Error, SystemClock};

pub const ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
pub const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

#[derive(Clone)]
pub struct AppState {
    pub answerer: Arc<dyn Answerer>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(answerer: Arc<dyn Answerer>) -> Self {
        Self {
            answerer,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            // `get` would also answer HEAD; only the listed methods are served.
            on(MethodFilter::GET, status)
                .post(chat)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        // `CorsLayer` refuses credentials with a wildcard origin; the headers are set verbatim.
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

/// Trimmed, non-empty `message` from a JSON body.
pub fn parse_message(body: &[u8]) -> webreply_core::Result<String> {
    let req: ChatRequest = serde_json::from_slice(body)
        .map_err(|e| Error::Validation(format!("invalid body: {e}")))?;
    let message = req.message.as_deref().map(str::trim).unwrap_or("");
    if message.is_empty() {
        return Err(Error::Validation("message missing or blank".to_string()));
    }
    Ok(message.to_string())
}

async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Json<ChatReply>, ApiError> {
    let query = parse_message(&body)?;
    tracing::info!(query = %query, "chat request");
    let payload = state.answerer.answer(&query).await?;
    tracing::info!(sources = payload.sources.len(), "answer ready");
    Ok(Json(ChatReply::new(&query, payload, state.clock.now())))
}

async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport::online(state.clock.now()))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::Internal(format!("panic: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_trims() {
        assert_eq!(
            parse_message(br#"{"message":"  what is rust  "}"#).unwrap(),
            "what is rust"
        );
    }

    #[test]
    fn parse_message_rejects_missing_blank_and_malformed() {
        let bodies: [&[u8]; 6] = [
            b"",
            b"not json",
            br#"{}"#,
            br#"{"message":null}"#,
            br#"{"message":"   "}"#,
            br#"{"message":42}"#,
        ];
        for body in bodies {
            assert!(
                matches!(parse_message(body), Err(Error::Validation(_))),
                "body={:?}",
                String::from_utf8_lossy(body)
            );
        }
        let err: ApiError = parse_message(b"{}").unwrap_err().into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
