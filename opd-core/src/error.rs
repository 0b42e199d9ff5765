/// Error types for the OPD client
use serde_json::Value;
use thiserror::Error;

/// Shown when the server produced no usable message.
pub const GENERIC_FAILURE: &str = "Request failed. Please try again.";

/// Main error type for OPD client operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response at all (connection refused, DNS, timeout). Session is kept.
    #[error("Cannot reach server. Check your connection and try again. ({0})")]
    Network(String),

    /// 401 from the backend. The session has already been cleared.
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    /// 403 from the backend.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Any other non-success status, carrying the deepest server message found
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Response body could not be understood
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// Client-side validation failed before any network call
    #[error("{0}")]
    Validation(String),

    /// Something the operation needed does not exist on the backend
    #[error("{0}")]
    NotFound(String),

    /// Durable client storage failed
    #[error("Local storage error: {0}")]
    Storage(String),

    /// Client could not be constructed
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Type alias for Results using ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Build the error for a non-success HTTP status from its raw body.
    ///
    /// 401 and 403 keep their dedicated variants; everything else becomes
    /// `Rejected` with the deepest message the body carries.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| extract_server_message(&v));
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden(
                message.unwrap_or_else(|| "insufficient permissions".to_string()),
            ),
            _ => ApiError::Rejected {
                status,
                message: message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            },
        }
    }

    /// The server-provided message, if this error carries one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if message != GENERIC_FAILURE => {
                Some(message.as_str())
            }
            ApiError::Forbidden(message) => Some(message.as_str()),
            ApiError::Validation(message) | ApiError::NotFound(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Pull a user-facing message out of an error body.
///
/// Looks at `message` first, then `data.message`. Blank strings count as missing.
pub fn extract_server_message(body: &Value) -> Option<String> {
    let non_blank = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    non_blank(body.get("message")).or_else(|| {
        non_blank(body.get("data").and_then(|d| d.get("message")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_prefers_top_level() {
        let body = json!({"message": "Subject is required", "data": {"message": "inner"}});
        assert_eq!(
            extract_server_message(&body).as_deref(),
            Some("Subject is required")
        );
    }

    #[test]
    fn message_falls_back_to_nested() {
        let body = json!({"message": "  ", "data": {"message": "Company code already exists"}});
        assert_eq!(
            extract_server_message(&body).as_deref(),
            Some("Company code already exists")
        );
        assert_eq!(extract_server_message(&json!({"errors": []})), None);
    }

    #[test]
    fn from_status_maps_taxonomy() {
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
        assert!(matches!(
            ApiError::from_status(403, r#"{"message":"nope"}"#),
            ApiError::Forbidden(m) if m == "nope"
        ));
        assert_eq!(
            ApiError::from_status(422, r#"{"data":{"message":"bad date"}}"#),
            ApiError::Rejected {
                status: 422,
                message: "bad date".to_string()
            }
        );
        assert_eq!(
            ApiError::from_status(500, "<html>oops</html>"),
            ApiError::Rejected {
                status: 500,
                message: GENERIC_FAILURE.to_string()
            }
        );
        assert_eq!(ApiError::from_status(500, "").server_message(), None);
        assert_eq!(
            ApiError::from_status(400, r#"{"message":"Date is locked"}"#).server_message(),
            Some("Date is locked")
        );
    }
}
