use std::fmt;

use speedwatch_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    Connect,
    Timeout,
    Other,
}

impl fmt::Display for NetworkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkFailure::Connect => write!(f, "connection failed"),
            NetworkFailure::Timeout => write!(f, "timeout"),
            NetworkFailure::Other => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// A local precondition failed; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The backend answered with a non-2xx status.
    #[error("backend returned status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Transport {
        status: u16,
        message: Option<String>,
        raw: String,
    },
    /// The call could not complete.
    #[error("{kind}: {message}")]
    Network {
        kind: NetworkFailure,
        message: String,
    },
    /// The response body does not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),
    /// The client could not be built from its settings.
    #[error("invalid client settings: {0}")]
    Setup(String),
}

/// Why [`crate::UploadSession::select_file`] did not take the file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    /// The slot is held by a running upload; the file was dropped.
    #[error("an upload is already running; reset before choosing another file")]
    Busy,
}

impl ApiError {
    pub(crate) fn network(kind: NetworkFailure, message: impl Into<String>) -> Self {
        Self::Network {
            kind,
            message: message.into(),
        }
    }

    /// Single human-readable message for display.
    ///
    /// Validation errors describe themselves; backend errors use the server's
    /// message when it sent one; everything else falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation(err) => err.to_string(),
            ApiError::Transport {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for failures of the call itself, as opposed to local or shape errors.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Network { .. })
    }
}

/// Best-effort message from a JSON error body (`{"error": ...}` or `{"message": ...}`).
pub(crate) fn extract_server_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_error_field() {
        let raw = r#"{"error": "No file uploaded", "message": "ignored"}"#;
        assert_eq!(extract_server_message(raw).as_deref(), Some("No file uploaded"));
    }

    #[test]
    fn server_message_missing_for_non_json() {
        assert_eq!(extract_server_message("<html>502</html>"), None);
        assert_eq!(extract_server_message(r#"{"error": "  "}"#), None);
        assert_eq!(extract_server_message("[1,2]"), None);
    }

    #[test]
    fn user_message_uses_fallback_without_server_text() {
        let err = ApiError::Transport {
            status: 500,
            message: None,
            raw: String::new(),
        };
        assert_eq!(err.user_message("Upload failed"), "Upload failed");

        let err = ApiError::network(NetworkFailure::Connect, "refused");
        assert_eq!(err.user_message("Upload failed"), "Upload failed");
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::Transport {
            status: 400,
            message: Some("No selected file".to_string()),
            raw: r#"{"error":"No selected file"}"#.to_string(),
        };
        assert_eq!(err.user_message("Upload failed"), "No selected file");
        assert!(err.is_transport_failure());
        assert!(!err.is_not_found());
    }
}
