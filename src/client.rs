use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS, STREAM_TTFB,
};
use crate::sse::process_sse;
use crate::types::{
    ApiErrorBody, ApiErrorResponse, GenerateContentRequest, GenerateContentResponse, Model,
};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// A boxed stream of response chunks.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>;

/// Client for the Generative Language API.
#[derive(Clone)]
pub struct GenerativeAi {
    api_key: HeaderValue,
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for GenerativeAi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeAi")
            .field("api_key", &"***")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GenerativeAi {
    /// Create a new client for the public endpoint.
    ///
    /// Fails with a configuration error when the key is empty or cannot be
    /// carried in a header.  Whether the key is *valid* is only known after
    /// the first request.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds the whole request including the streamed body; by
    /// default only connecting is bounded.
    pub fn with_options(
        api_key: &str,
        base_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::configuration("API key must not be empty"));
        }
        let mut api_key = HeaderValue::from_str(api_key).map_err(|_| {
            Error::configuration("API key contains characters that are not allowed in a header")
        })?;
        api_key.set_sensitive(true);

        let base_url = parse_base_url(base_url.unwrap_or(DEFAULT_API_URL))?;

        let mut builder = ReqwestClient::builder().connect_timeout(DEFAULT_CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers
    }

    fn endpoint(&self, model: &Model, method: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("models/{model}:{method}"))?)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        CLIENT_REQUEST_ERRORS.click();
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let err = match serde_json::from_str::<ApiErrorResponse>(&error_body) {
            Ok(parsed) => error_from_body(status_code, &parsed.error, retry_after),
            Err(_) => {
                let body = ApiErrorBody {
                    code: Some(status_code),
                    message: error_body,
                    status: None,
                    details: Vec::new(),
                };
                error_from_body(status_code, &body, retry_after)
            }
        };
        tracing::debug!(status_code, error = %err, "request rejected");
        err
    }

    async fn post(
        &self,
        url: Url,
        headers: HeaderMap,
        body: &GenerateContentRequest,
    ) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        self.timeout.map(|t| t.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Send a request and wait for the complete response.
    pub async fn generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model, "generateContent")?;
        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }

        let start = Instant::now();
        let response = self.post(url, self.default_headers(), request).await?;
        let response = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
            })?;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if let Some(logger) = &self.logger {
            logger.log_response(&response);
        }
        Ok(response)
    }

    /// Send a request and get the reply as a stream of chunks.
    ///
    /// HTTP-level rejections (bad key, quota, unknown model) are returned
    /// here; failures after the first byte arrive through the stream.
    pub async fn stream_generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<ResponseStream> {
        let mut url = self.endpoint(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");
        if let Some(logger) = &self.logger {
            logger.log_request(model, request);
        }
        tracing::debug!(%model, contents = request.contents.len(), "streaming request");

        let mut headers = self.default_headers();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );

        let start = Instant::now();
        let response = self.post(url, headers, request).await?;
        STREAM_TTFB.add(start.elapsed().as_secs_f64());

        let stream = process_sse(response.bytes_stream());
        match self.logger.clone() {
            Some(logger) => Ok(Box::pin(stream.inspect(move |chunk| {
                if let Ok(chunk) = chunk {
                    logger.log_stream_chunk(chunk);
                }
            }))),
            None => Ok(Box::pin(stream)),
        }
    }
}

/// Map an HTTP status and error body onto the error taxonomy.
pub(crate) fn error_from_body(
    status_code: u16,
    body: &ApiErrorBody,
    retry_after: Option<u64>,
) -> Error {
    let message = body.message.clone();
    match status_code {
        400 => match body.status.as_deref() {
            None | Some("INVALID_ARGUMENT") => Error::invalid_argument(message, body.reason()),
            Some(status) => Error::api(status_code, Some(status.to_string()), message),
        },
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 | 504 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502 | 503 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, body.status.clone(), message),
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Url::parse(&normalized)
        .map_err(|e| Error::configuration(format!("Invalid base URL '{base_url}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::types::KnownModel;

    #[test]
    fn client_creation() {
        let client = GenerativeAi::new("test-key").unwrap();
        assert_eq!(client.base_url.as_str(), DEFAULT_API_URL);
        assert_eq!(client.timeout, None);

        let client = GenerativeAi::with_options(
            "test-key",
            Some("http://127.0.0.1:9999/v1beta"),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "http://127.0.0.1:9999/v1beta/");
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn empty_key_is_a_configuration_error() {
        let err = GenerativeAi::new("   ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unprintable_key_is_a_configuration_error() {
        let err = GenerativeAi::new("abc\ndef").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn bad_base_url_is_a_configuration_error() {
        let err = GenerativeAi::with_options("key", Some("not a url"), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn debug_redacts_key() {
        let client = GenerativeAi::new("super-secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn endpoints() {
        let client = GenerativeAi::new("key").unwrap();
        let url = client
            .endpoint(&Model::Known(KnownModel::Gemini15Flash), "streamGenerateContent")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:streamGenerateContent"
        );
    }

    #[test]
    fn status_mapping() {
        let body = |status: Option<&str>| ApiErrorBody {
            code: None,
            message: "nope".to_string(),
            status: status.map(String::from),
            details: Vec::new(),
        };
        assert!(error_from_body(400, &body(Some("INVALID_ARGUMENT")), None).is_invalid_argument());
        assert_eq!(
            error_from_body(400, &body(Some("FAILED_PRECONDITION")), None).kind(),
            ErrorKind::Transient
        );
        assert!(error_from_body(401, &body(None), None).is_authentication());
        assert!(error_from_body(403, &body(Some("PERMISSION_DENIED")), None).is_permission());
        assert!(error_from_body(429, &body(None), Some(7)).is_rate_limit());
        assert!(error_from_body(503, &body(None), None).is_server_error());
        assert_eq!(
            error_from_body(418, &body(None), None).status_code(),
            Some(418)
        );
    }
}
