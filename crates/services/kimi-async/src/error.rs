use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Kimi client.
#[derive(Debug, Error)]
pub enum KimiError {
    /// Transport-level failure from reqwest
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Error response from the Moonshot API
    #[error("API error: {0:?}")]
    Api(ApiErrorObject),

    /// Client misconfiguration (missing credentials, bad base URL)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Response body could not be deserialized
    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Structured API error payload.
#[derive(Debug, Clone)]
pub struct ApiErrorObject {
    /// HTTP status code of the failed response
    pub status: u16,
    /// Error type reported by the API, when present
    pub r#type: Option<String>,
    /// Human-readable error message
    pub message: String,
}

/// Moonshot error envelope: `{"error": {"message": ..., "type": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Builds a [`KimiError::Api`] from a non-success response body.
///
/// Falls back to the raw body text when the envelope does not parse.
#[must_use]
pub fn deserialize_api_error(status: reqwest::StatusCode, bytes: &[u8]) -> KimiError {
    match serde_json::from_slice::<ErrorEnvelope>(bytes) {
        Ok(env) => KimiError::Api(ApiErrorObject {
            status: status.as_u16(),
            r#type: env.error.kind,
            message: env.error.message,
        }),
        Err(_) => KimiError::Api(ApiErrorObject {
            status: status.as_u16(),
            r#type: None,
            message: String::from_utf8_lossy(bytes).into_owned(),
        }),
    }
}

/// Wraps a deserialization failure with a snippet of the offending body.
#[must_use]
pub fn map_deser(e: &serde_json::Error, bytes: &[u8]) -> KimiError {
    let body = String::from_utf8_lossy(bytes);
    let snippet: String = body.chars().take(400).collect();
    KimiError::Serde(format!("{e}: {snippet}"))
}
