use serde::Deserialize;
use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant is terminal for the action that triggered it; nothing is retried.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Unable to reach service: {0}")]
    Transport(String),

    #[error("Request failed ({status})")]
    Status { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Could not read {path}: {reason}")]
    LocalFile { path: String, reason: String },

    /// A 2xx response whose JSON body carries an `error` field.
    #[error("{0}")]
    Rejected(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Text for endpoints whose error body is shown verbatim (ingest, chat).
    pub fn body_message(&self) -> String {
        match self {
            ApiError::Status { body, .. } if !body.trim().is_empty() => body.trim().to_string(),
            other => other.to_string(),
        }
    }

    /// Text for the auth endpoints: `detail` or `message` from a JSON body,
    /// otherwise the generic status line.
    pub fn auth_message(&self) -> String {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|parsed| {
                    // FastAPI validation errors put a list in `detail`; only plain strings are shown
                    let detail = parsed.detail.and_then(|d| d.as_str().map(str::to_string));
                    detail.or(parsed.message)
                })
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| self.to_string()),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
