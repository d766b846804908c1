//! Error types for Aurora.
//!
//! Every failure in the crate is an [`Error`].  Callers that need to decide
//! *what to do* about a failure (halt, show remediation, keep looping) switch
//! on [`Error::kind`], which folds the many concrete variants into the small
//! closed [`ErrorKind`] taxonomy.

use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;
use std::sync::Arc;

/// The closed set of failure classes that drive user-facing policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credential could be resolved from any source.  Fatal at startup.
    MissingCredential,
    /// The remote client rejected its configuration outright.  Fatal at startup.
    Configuration,
    /// The remote API rejected the credential during a send.  Recoverable per turn.
    InvalidCredential,
    /// Any other failure during a send.  Recoverable per turn.
    Transient,
    /// A required local asset is absent.  Fatal at startup.
    MissingResource,
}

impl ErrorKind {
    /// Returns true if the session survives an error of this kind.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::InvalidCredential | ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::Transient => "transient",
            ErrorKind::MissingResource => "missing_resource",
        };
        f.write_str(name)
    }
}

/// The main error type for Aurora.
#[derive(Clone, Debug)]
pub enum Error {
    /// A generic API error occurred.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Canonical status string from the API, e.g. `RESOURCE_EXHAUSTED`.
        status: Option<String>,
        /// Human-readable error message.
        message: String,
    },

    /// The API did not accept the credential.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// The credential is not allowed to call the API.
    Permission {
        /// Human-readable error message.
        message: String,
    },

    /// The request was rejected as invalid.  The API reports malformed or
    /// unknown keys this way.
    InvalidArgument {
        /// Human-readable error message.
        message: String,
        /// Machine-readable reason from the error details, if any.
        reason: Option<String>,
    },

    /// Resource not found, typically an unknown model.
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Rate limit or quota exceeded.
    RateLimit {
        /// Human-readable error message.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// Request timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// Connection error.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Server returned a 500 internal error.
    InternalServer {
        /// Human-readable error message.
        message: String,
    },

    /// Server is overloaded or unavailable.
    ServiceUnavailable {
        /// Human-readable error message.
        message: String,
        /// Time to wait before retrying, in seconds.
        retry_after: Option<u64>,
    },

    /// The model refused to answer the prompt.
    Blocked {
        /// The block or finish reason reported by the API.
        reason: String,
    },

    /// The turn was cancelled before the reply completed.
    Cancelled {
        /// Human-readable error message.
        message: String,
    },

    /// Error during JSON or YAML serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// A streaming error occurred.
    Streaming {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Encoding/decoding error.
    Encoding {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// An operation would break a local invariant.
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// The client could not be configured.
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// No credential was found in any source.
    MissingCredential {
        /// Human-readable error message.
        message: String,
    },

    /// The secrets store is not configured at all.
    SecretsUnavailable {
        /// Human-readable error message.
        message: String,
    },

    /// A required local file is absent.
    MissingResource {
        /// Human-readable error message.
        message: String,
        /// Path of the missing file.
        path: PathBuf,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, status: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            status,
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>, reason: Option<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
            reason,
        }
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new internal server error.
    pub fn internal_server(message: impl Into<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
        }
    }

    /// Creates a new service unavailable error.
    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new blocked-response error.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Error::Blocked {
            reason: reason.into(),
        }
    }

    /// Creates a new cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Error::Cancelled {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new streaming error.
    pub fn streaming(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Streaming {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new encoding error.
    pub fn encoding(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Encoding {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new missing credential error.
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Error::MissingCredential {
            message: message.into(),
        }
    }

    /// Creates a new secrets-unavailable error.
    pub fn secrets_unavailable(message: impl Into<String>) -> Self {
        Error::SecretsUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new missing resource error.
    pub fn missing_resource(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::MissingResource {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Classifies this error into the policy taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. }
            | Error::Permission { .. }
            | Error::InvalidArgument { .. } => ErrorKind::InvalidCredential,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::MissingCredential { .. } => ErrorKind::MissingCredential,
            Error::MissingResource { .. } => ErrorKind::MissingResource,
            _ => ErrorKind::Transient,
        }
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is related to permissions.
    pub fn is_permission(&self) -> bool {
        matches!(self, Error::Permission { .. })
    }

    /// Returns true if this error is an invalid argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    /// Returns true if this error is related to rate limiting.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    /// Returns true if the turn was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// Returns true if this error is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Error::InternalServer { .. } | Error::ServiceUnavailable { .. }
        )
    }

    /// Returns true if the secrets store is not configured.
    pub fn is_secrets_unavailable(&self) -> bool {
        matches!(self, Error::SecretsUnavailable { .. })
    }

    /// Returns the HTTP status the API answered with, if this error came
    /// from one.  Variants covering several statuses report the usual one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::InvalidArgument { .. } => Some(400),
            Error::Authentication { .. } => Some(401),
            Error::Permission { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::RateLimit { .. } => Some(429),
            Error::InternalServer { .. } => Some(500),
            Error::ServiceUnavailable { .. } => Some(503),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                status,
                message,
            } => {
                if let Some(status) = status {
                    write!(f, "{status_code} {status}: {message}")
                } else {
                    write!(f, "API error {status_code}: {message}")
                }
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::Permission { message } => {
                write!(f, "Permission denied: {message}")
            }
            Error::InvalidArgument { message, reason } => {
                if let Some(reason) = reason {
                    write!(f, "Invalid argument: {message} ({reason})")
                } else {
                    write!(f, "Invalid argument: {message}")
                }
            }
            Error::NotFound { message } => {
                write!(f, "Not found: {message}")
            }
            Error::RateLimit {
                message,
                retry_after,
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Rate limit exceeded: {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Rate limit exceeded: {message}")
                }
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::InternalServer { message } => {
                write!(f, "Internal server error: {message}")
            }
            Error::ServiceUnavailable {
                message,
                retry_after,
            } => {
                if let Some(retry_after) = retry_after {
                    write!(
                        f,
                        "Service unavailable: {message} (retry after {retry_after} seconds)"
                    )
                } else {
                    write!(f, "Service unavailable: {message}")
                }
            }
            Error::Blocked { reason } => {
                write!(f, "Response blocked: {reason}")
            }
            Error::Cancelled { message } => {
                write!(f, "Cancelled: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Streaming { message, .. } => {
                write!(f, "Streaming error: {message}")
            }
            Error::Encoding { message, .. } => {
                write!(f, "Encoding error: {message}")
            }
            Error::Validation { message } => {
                write!(f, "Validation error: {message}")
            }
            Error::Configuration { message } => {
                write!(f, "Configuration error: {message}")
            }
            Error::MissingCredential { message } => {
                write!(f, "{message}")
            }
            Error::SecretsUnavailable { message } => {
                write!(f, "Secrets store unavailable: {message}")
            }
            Error::MissingResource { message, .. } => {
                write!(f, "{message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            Error::Streaming { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Encoding { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::serialization(format!("YAML error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::encoding(format!("UTF-8 error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for Aurora operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_rejections_are_invalid_credential() {
        assert_eq!(
            Error::permission("denied").kind(),
            ErrorKind::InvalidCredential
        );
        assert_eq!(
            Error::authentication("bad key").kind(),
            ErrorKind::InvalidCredential
        );
        assert_eq!(
            Error::invalid_argument("API key not valid", Some("API_KEY_INVALID".to_string()))
                .kind(),
            ErrorKind::InvalidCredential
        );
    }

    #[test]
    fn runtime_failures_are_transient() {
        for err in [
            Error::rate_limit("slow down", Some(3)),
            Error::internal_server("boom"),
            Error::cancelled("user interrupt"),
            Error::blocked("SAFETY"),
            Error::streaming("cut off", None),
            Error::api(418, None, "teapot"),
        ] {
            assert_eq!(err.kind(), ErrorKind::Transient, "{err}");
            assert!(err.kind().is_recoverable());
        }
    }

    #[test]
    fn startup_failures_are_fatal() {
        let fatal = [
            Error::missing_credential("API Key is required to proceed."),
            Error::configuration("empty key"),
            Error::missing_resource("avatar missing", "aurora_avatar.jpg"),
        ];
        for err in fatal {
            assert!(!err.kind().is_recoverable(), "{err}");
        }
    }

    #[test]
    fn display_includes_status() {
        let err = Error::api(409, Some("ABORTED".to_string()), "try again");
        assert_eq!(err.to_string(), "409 ABORTED: try again");
        let err = Error::invalid_argument("API key not valid", Some("API_KEY_INVALID".into()));
        assert_eq!(
            err.to_string(),
            "Invalid argument: API key not valid (API_KEY_INVALID)"
        );
    }

    #[test]
    fn status_codes_of_api_rejections() {
        let cases = [
            (Error::invalid_argument("API key not valid", None), Some(400)),
            (Error::authentication("bad key"), Some(401)),
            (Error::permission("denied"), Some(403)),
            (Error::not_found("no such model"), Some(404)),
            (Error::rate_limit("slow down", None), Some(429)),
            (Error::internal_server("boom"), Some(500)),
            (Error::service_unavailable("busy", Some(1)), Some(503)),
            (Error::api(418, None, "teapot"), Some(418)),
            (Error::streaming("cut off", None), None),
            (Error::configuration("empty key"), None),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(error::Error::source(&err).is_some());
    }
}
