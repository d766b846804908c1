//! Logging hook for client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every request and response passing through the [`GenerativeAi`] client, and
//! [`TracingLogger`], which forwards them to `tracing` at trace level.
//!
//! [`GenerativeAi`]: crate::GenerativeAi

use crate::types::{GenerateContentRequest, GenerateContentResponse, Model};

/// A trait for logging client operations.
///
/// # Example
///
/// ```rust,ignore
/// use aurora::{ClientLogger, GenerateContentRequest, GenerateContentResponse, Model};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, model: &Model, request: &GenerateContentRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{model}: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_response(&self, response: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Response: {}", serde_json::to_string(response).unwrap()).unwrap();
///     }
///
///     fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing request, streaming or not.
    fn log_request(&self, model: &Model, request: &GenerateContentRequest);

    /// Log a complete response from a non-streaming call.
    fn log_response(&self, response: &GenerateContentResponse);

    /// Log one chunk of a streamed response, in arrival order.
    fn log_stream_chunk(&self, chunk: &GenerateContentResponse);
}

/// A [`ClientLogger`] that emits `tracing` events at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ClientLogger for TracingLogger {
    fn log_request(&self, model: &Model, request: &GenerateContentRequest) {
        if let Ok(body) = serde_json::to_string(request) {
            tracing::trace!(%model, %body, "request");
        }
    }

    fn log_response(&self, response: &GenerateContentResponse) {
        if let Ok(body) = serde_json::to_string(response) {
            tracing::trace!(%body, "response");
        }
    }

    fn log_stream_chunk(&self, chunk: &GenerateContentResponse) {
        if let Ok(body) = serde_json::to_string(chunk) {
            tracing::trace!(%body, "stream chunk");
        }
    }
}
