//! JSON bodies the chat endpoint emits, success and failure alike.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use webreply_core::{ResponsePayload, SourceRef};

pub const APOLOGY: &str = "I apologize, but I encountered an error while processing your request. Please try again in a moment.";

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    pub message: String,
    pub sources: Vec<SourceRef>,
    pub timestamp: String,
    pub search_query: String,
    pub sources_count: usize,
}

impl ChatReply {
    pub fn new(query: &str, payload: ResponsePayload, now: DateTime<Utc>) -> Self {
        Self {
            success: true,
            sources_count: payload.sources.len(),
            message: payload.answer,
            sources: payload.sources,
            timestamp: timestamp(now),
            search_query: query.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub features: &'static [&'static str],
    pub timestamp: String,
}

impl StatusReport {
    pub fn online(now: DateTime<Utc>) -> Self {
        Self {
            status: "online",
            message: "webreply web scraping backend is running",
            version: env!("CARGO_PKG_VERSION"),
            features: &[
                "Real-time web scraping",
                "Multi-source analysis",
                "Intelligent response generation",
            ],
            timestamp: timestamp(now),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<webreply_core::Error> for ApiError {
    fn from(e: webreply_core::Error) -> Self {
        match e {
            webreply_core::Error::Validation(m) => Self::BadRequest(m),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Details stay in the logs; clients get fixed strings.
        let (status, body) = match &self {
            Self::BadRequest(msg) => {
                tracing::debug!(msg = %msg, "rejected request");
                (
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({ "error": "Message is required" }),
                )
            }
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                serde_json::json!({ "error": "Method not allowed" }),
            ),
            Self::Internal(msg) => {
                tracing::error!(msg = %msg, "chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error", "message": APOLOGY }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_is_millisecond_utc() {
        let t = Utc.with_ymd_and_hms(2025, 7, 4, 12, 30, 5).unwrap();
        assert_eq!(timestamp(t), "2025-07-04T12:30:05.000Z");
    }

    #[test]
    fn chat_reply_uses_camel_case_keys() {
        let payload = ResponsePayload {
            answer: "hi".to_string(),
            sources: vec![SourceRef {
                title: "T".to_string(),
                url: "https://t.example/".to_string(),
                source: "t.example".to_string(),
            }],
        };
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let v = serde_json::to_value(ChatReply::new("q", payload, t)).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["message"], "hi");
        assert_eq!(v["searchQuery"], "q");
        assert_eq!(v["sourcesCount"], 1);
        assert_eq!(v["sources"][0]["source"], "t.example");
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let e: ApiError = webreply_core::Error::Validation("blank".to_string()).into();
        assert!(matches!(e, ApiError::BadRequest(_)));
        let e: ApiError = webreply_core::Error::Unexpected("boom".to_string()).into();
        assert!(matches!(e, ApiError::Internal(_)));
        assert_eq!(
            e.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
