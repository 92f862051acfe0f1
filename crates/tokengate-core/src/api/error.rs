use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: reqwest::StatusCode,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build a rejection from a non-success status, keeping the server's
    /// `message` field when the body carries one.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty());
        ApiError::Rejected { status, message }
    }

    /// True when the collaborator was unreachable or answered with garbage
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::NetworkError(_) | ApiError::InvalidResponse(_))
    }

    /// The message to show a user: the server's own wording for a rejection,
    /// otherwise the caller's generic fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_extracts_message() {
        let err = ApiError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"invalid credentials"}"#,
        );
        assert_eq!(err.user_message("Login failed"), "invalid credentials");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_from_status_without_message_uses_fallback() {
        let html = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(html.user_message("Login failed"), "Login failed");

        let empty = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":""}"#);
        assert_eq!(empty.user_message("Registration failed"), "Registration failed");

        let other = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"nope"}"#);
        assert_eq!(other.user_message("Registration failed"), "Registration failed");
    }

    #[test]
    fn test_invalid_response_is_transport() {
        let err = ApiError::InvalidResponse("missing token".to_string());
        assert!(err.is_transport());
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }
}
