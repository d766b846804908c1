//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! `streamGenerateContent?alt=sse` answers with one `data:` line per chunk,
//! each holding a complete [`GenerateContentResponse`] JSON document, and
//! frames separated by a blank line (usually `\r\n\r\n`).

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::types::{ApiErrorResponse, GenerateContentResponse};
use crate::{Error, Result};

/// Process a stream of bytes into a stream of response chunks.
///
/// The returned stream ends after the first error: a broken event stream
/// cannot be resynchronised with the reply it was carrying.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(format!("Stream timed out: {e}"), None)
            } else {
                Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            }
        })
    });

    stream::unfold(
        (stream, Vec::<u8>::new(), false),
        move |(mut stream, mut buffer, failed)| async move {
            if failed {
                return None;
            }
            loop {
                // First check if we have a complete frame in the buffer
                if let Some(frame) = take_frame(&mut buffer) {
                    match parse_frame(&frame) {
                        Some(Ok(chunk)) => {
                            STREAM_CHUNKS.click();
                            return Some((Ok(chunk), (stream, buffer, false)));
                        }
                        Some(Err(err)) => {
                            STREAM_ERRORS.click();
                            return Some((Err(err), (stream, buffer, true)));
                        }
                        None => continue,
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => {
                        // End of stream; a final frame may lack its blank line.
                        let frame = std::mem::take(&mut buffer);
                        return match parse_frame(&frame) {
                            Some(Ok(chunk)) => {
                                STREAM_CHUNKS.click();
                                Some((Ok(chunk), (stream, buffer, true)))
                            }
                            Some(Err(err)) => {
                                STREAM_ERRORS.click();
                                Some((Err(err), (stream, buffer, true)))
                            }
                            None => None,
                        };
                    }
                }
            }
        },
    )
}

/// Remove and return the first complete frame of `buffer`, without its
/// terminating blank line.
fn take_frame(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let frame = buffer[..end].to_vec();
    buffer.drain(..end + 2);
    Some(frame)
}

/// Parse one frame.  Returns `None` for frames without data (comments,
/// keep-alives, stray blank lines).
fn parse_frame(frame: &[u8]) -> Option<Result<GenerateContentResponse>> {
    let text = match std::str::from_utf8(frame) {
        Ok(text) => text,
        Err(e) => {
            return Some(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let mut event_type = None;
    let mut data: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim());
        }
    }
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");

    if event_type == Some("error") {
        return Some(Err(stream_error(&data)));
    }

    let value = match serde_json::from_str::<serde_json::Value>(&data) {
        Ok(value) => value,
        Err(e) => {
            return Some(Err(Error::serialization(
                format!("Failed to parse stream chunk: {e}"),
                Some(Box::new(e)),
            )));
        }
    };
    if value.get("error").is_some() {
        return Some(Err(stream_error(&data)));
    }

    Some(
        serde_json::from_value::<GenerateContentResponse>(value).map_err(|e| {
            Error::serialization(
                format!("Failed to parse stream chunk: {e}"),
                Some(Box::new(e)),
            )
        }),
    )
}

/// Turn an error document delivered inside the event stream into an `Error`.
fn stream_error(data: &str) -> Error {
    match serde_json::from_str::<ApiErrorResponse>(data) {
        Ok(response) => {
            let status_code = response.error.code.unwrap_or(500);
            crate::client::error_from_body(status_code, &response.error, None)
        }
        Err(_) => Error::api(500, Some("stream_error".to_string()), data),
    }
}
