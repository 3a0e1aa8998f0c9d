use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    ServerError,
    Malformed,
    InvalidCredentials,
    NetworkFailure,
    Rejected,
    Storage,
}

/// How a screen should surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// The session is gone; the redirect has already been signalled.
    Redirect,
    /// Show the message with a retry action.
    Retry,
    /// Show the message next to the form that caused it.
    Inline,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized (HTTP 401)")]
    Unauthorized,

    #[error("server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("malformed response: {detail}")]
    Malformed { detail: String },

    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("network failure: {detail}")]
    NetworkFailure { detail: String, timed_out: bool },

    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("credential store failure: {detail}")]
    Storage { detail: String },
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Unauthorized => ApiErrorKind::Unauthorized,
            ApiError::ServerError { .. } => ApiErrorKind::ServerError,
            ApiError::Malformed { .. } => ApiErrorKind::Malformed,
            ApiError::InvalidCredentials { .. } => ApiErrorKind::InvalidCredentials,
            ApiError::NetworkFailure { .. } => ApiErrorKind::NetworkFailure,
            ApiError::Rejected { .. } => ApiErrorKind::Rejected,
            ApiError::Storage { .. } => ApiErrorKind::Storage,
        }
    }

    pub fn presentation(&self) -> Presentation {
        match self {
            ApiError::Unauthorized => Presentation::Redirect,
            ApiError::InvalidCredentials { .. } => Presentation::Inline,
            _ => Presentation::Retry,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::NetworkFailure { timed_out: true, .. })
    }

    /// Text for the end user. Malformed bodies read like a server error.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Session expired. Please login again.".to_string(),
            ApiError::ServerError { .. } | ApiError::Malformed { .. } => {
                "Server error. Please try again later.".to_string()
            }
            ApiError::InvalidCredentials { message } => message.clone(),
            ApiError::NetworkFailure { timed_out: true, .. } => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ApiError::NetworkFailure { .. } => {
                "Could not reach the server. Check your connection and retry.".to_string()
            }
            ApiError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Rejected { .. } => "Error loading data".to_string(),
            ApiError::Storage { .. } => "Could not save your session on this device.".to_string(),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        ApiError::NetworkFailure {
            timed_out: err.is_timeout(),
            detail: err.to_string(),
        }
    }
}

/// Best human-readable message from an error body: `message`, then `error`, then the
/// raw text.
pub(crate) fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                if !s.trim().is_empty() {
                    return s.trim().to_string();
                }
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_prefers_message_then_error_then_raw() {
        assert_eq!(error_message(r#"{"message":"Invalid password"}"#), "Invalid password");
        assert_eq!(error_message(r#"{"error":"No such user"}"#), "No such user");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"message":""}"#), r#"{"message":""}"#);
    }

    #[test]
    fn malformed_is_displayed_like_a_server_error() {
        let malformed = ApiError::Malformed { detail: "eof".into() };
        let server = ApiError::ServerError { status: 500, message: "boom".into() };
        assert_eq!(malformed.user_message(), server.user_message());
        assert_eq!(malformed.presentation(), Presentation::Retry);
    }

    #[test]
    fn unauthorized_redirects_and_login_errors_are_inline() {
        assert_eq!(ApiError::Unauthorized.presentation(), Presentation::Redirect);
        let bad_login = ApiError::InvalidCredentials { message: "Wrong password".into() };
        assert_eq!(bad_login.presentation(), Presentation::Inline);
        assert_eq!(bad_login.user_message(), "Wrong password");
        assert_eq!(bad_login.kind(), ApiErrorKind::InvalidCredentials);
    }
}
