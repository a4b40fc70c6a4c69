//! Backend client error types.

use serde::Deserialize;

/// Broad failure category, used to surface upstream errors distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, timeout or HTTP status failure.
    Transport,
    /// The arrival provider reported a non-zero status inside a 2xx response.
    Upstream,
    /// The response body could not be decoded.
    Decode,
}

/// Errors from the backend HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure that did not originate in reqwest
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend returned an error status code
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// The provider's own header carried a failure code
    #[error("upstream error {code}: {message}")]
    Upstream { code: String, message: String },
}

/// Error bodies the backend sends alongside non-2xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Http(_) | ApiError::Transport(_) | ApiError::Status { .. } => {
                FailureKind::Transport
            }
            ApiError::Json { .. } => FailureKind::Decode,
            ApiError::Upstream { .. } => FailureKind::Upstream,
        }
    }

    /// Structured `message` carried by the failure payload, if any.
    pub fn payload_message(&self) -> Option<String> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty()),
            ApiError::Upstream { message, .. } if !message.trim().is_empty() => {
                Some(message.clone())
            }
            _ => None,
        }
    }

    /// Transport-level error text, if non-empty.
    pub fn transport_message(&self) -> Option<String> {
        let text = match self {
            ApiError::Http(e) => e.to_string(),
            ApiError::Transport(msg) => msg.clone(),
            other => other.to_string(),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ApiError::Status {
            status: 500,
            body: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        let err = ApiError::Upstream {
            code: "4".into(),
            message: "결과가 없습니다.".into(),
        };
        assert_eq!(err.to_string(), "upstream error 4: 결과가 없습니다.");

        let err = ApiError::Json {
            message: "expected string".into(),
            body: Some("{}".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));
    }

    #[test]
    fn kinds() {
        assert_eq!(
            ApiError::Transport("timed out".into()).kind(),
            FailureKind::Transport
        );
        assert_eq!(
            ApiError::Status {
                status: 404,
                body: String::new()
            }
            .kind(),
            FailureKind::Transport
        );
        assert_eq!(
            ApiError::Upstream {
                code: "8".into(),
                message: String::new()
            }
            .kind(),
            FailureKind::Upstream
        );
        assert_eq!(
            ApiError::Json {
                message: String::new(),
                body: None
            }
            .kind(),
            FailureKind::Decode
        );
    }

    #[test]
    fn payload_message_from_json_body() {
        let err = ApiError::Status {
            status: 409,
            body: r#"{"message":"already saved","status":409}"#.into(),
        };
        assert_eq!(err.payload_message().as_deref(), Some("already saved"));

        let err = ApiError::Status {
            status: 500,
            body: "<html>oops</html>".into(),
        };
        assert_eq!(err.payload_message(), None);

        let err = ApiError::Status {
            status: 500,
            body: r#"{"message":"  "}"#.into(),
        };
        assert_eq!(err.payload_message(), None);
    }

    #[test]
    fn transport_message_skips_empty_text() {
        assert_eq!(ApiError::Transport(String::new()).transport_message(), None);
        assert_eq!(
            ApiError::Transport("connection refused".into())
                .transport_message()
                .as_deref(),
            Some("connection refused")
        );
    }
}
