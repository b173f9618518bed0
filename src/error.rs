use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error as ThisError;

use crate::types::ApiVersion;

/// Longest upstream body excerpt forwarded to callers.
pub const DETAIL_LIMIT: usize = 2000;

/// How many listed models an exhaustion error shows.
pub const AVAILABLE_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, ThisError)]
pub enum RelayError {
    #[error("Prompt is required.")]
    EmptyPrompt,

    #[error("Missing GEMINI_API_KEY.")]
    MissingApiKey,

    #[error("{0}")]
    Upstream(Box<UpstreamFailure>),

    #[error("{}", exhausted_message(.last))]
    Exhausted {
        last: Option<LastAttempt>,
        available_sample: Vec<String>,
    },

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),
}

impl From<figment::Error> for RelayError {
    fn from(e: figment::Error) -> Self {
        RelayError::Config(Box::new(e))
    }
}

/// Non-retryable upstream rejection, passed through verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamFailure {
    pub status: StatusCode,
    pub message: String,
    pub detail: String,
    pub model: String,
    pub version: ApiVersion,
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Most recent not-found attempt of the fallback loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastAttempt {
    pub status: u16,
    pub body: String,
    pub candidate: String,
    #[serde(rename = "ver")]
    pub version: ApiVersion,
}

fn exhausted_message(last: &Option<LastAttempt>) -> String {
    match last {
        Some(last) => format!(
            "All candidate models failed. Last 404 for '{}' using {}.",
            last.candidate, last.version
        ),
        None => "Model call failed.".to_string(),
    }
}

/// Clip an upstream body to at most `DETAIL_LIMIT` characters.
pub fn excerpt(body: &str) -> String {
    body.chars().take(DETAIL_LIMIT).collect()
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::EmptyPrompt => StatusCode::BAD_REQUEST,
            RelayError::Upstream(failure) => failure.status,
            RelayError::Exhausted { .. } => StatusCode::NOT_FOUND,
            RelayError::MissingApiKey
            | RelayError::Reqwest(_)
            | RelayError::UrlParse(_)
            | RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.to_string();
        let body = match self {
            RelayError::Upstream(failure) => ApiErrorResponse {
                details: Some(failure.detail),
                model: Some(failure.model),
                version_tried: Some(failure.version),
                ..ApiErrorResponse::new(message)
            },
            RelayError::Exhausted {
                last,
                available_sample,
            } => {
                let available = if available_sample.is_empty() {
                    json!("Could not fetch available models")
                } else {
                    json!(available_sample)
                };
                ApiErrorResponse {
                    details: last.as_ref().map(|l| l.body.clone()),
                    last_tried: last,
                    available_models: Some(available),
                    suggestion: Some(
                        "Try visiting /api/gemini/models to see available models".to_string(),
                    ),
                    ..ApiErrorResponse::new(message)
                }
            }
            _ => ApiErrorResponse::new(message),
        };
        (status, Json(body)).into_response()
    }
}

/// Error body rendered inline by browser callers; `error` is always plain text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_tried: Option<ApiVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tried: Option<LastAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_models: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            model: None,
            version_tried: None,
            last_tried: None,
            available_models: None,
            suggestion: None,
        }
    }
}

/// Gemini API error response structure
#[derive(Deserialize, Debug, Default)]
pub struct GeminiError {
    #[serde(default)]
    pub error: GeminiErrorBody,
}

#[derive(Deserialize, Debug, Default)]
pub struct GeminiErrorBody {
    pub code: Option<u32>,
    pub message: Option<String>,
    pub status: Option<String>,
}

impl GeminiError {
    pub const NOT_FOUND_STATUS: &'static str = "NOT_FOUND";

    pub fn parse_lenient(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn is_not_found(&self) -> bool {
        self.error.status.as_deref() == Some(Self::NOT_FOUND_STATUS)
    }
}
