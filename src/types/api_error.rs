use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorBody,
}

/// The `error` object of an [`ApiErrorResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// HTTP status code echoed by the API.
    #[serde(default)]
    pub code: Option<u16>,

    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Canonical status string, e.g. `INVALID_ARGUMENT`.
    #[serde(default)]
    pub status: Option<String>,

    /// Structured details; `ErrorInfo` entries carry a `reason`.
    #[serde(default)]
    pub details: Vec<Value>,
}

impl ApiErrorBody {
    /// The first `reason` found among the details, e.g. `API_KEY_INVALID`.
    pub fn reason(&self) -> Option<String> {
        self.details
            .iter()
            .find_map(|detail| detail.get("reason").and_then(Value::as_str))
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_invalid_key_error() {
        let body = r#"{
          "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT",
            "details": [
              {
                "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                "reason": "API_KEY_INVALID",
                "domain": "googleapis.com"
              }
            ]
          }
        }"#;
        let response: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.error.code, Some(400));
        assert_eq!(response.error.status.as_deref(), Some("INVALID_ARGUMENT"));
        assert_eq!(response.error.reason().as_deref(), Some("API_KEY_INVALID"));
    }

    #[test]
    fn details_are_optional() {
        let response: ApiErrorResponse =
            serde_json::from_str(r#"{"error": {"code": 403, "message": "denied"}}"#).unwrap();
        assert_eq!(response.error.reason(), None);
        assert_eq!(response.error.status, None);
    }
}
