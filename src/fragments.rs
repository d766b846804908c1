//! Cancellable, forward-only producer of reply fragments.
//!
//! A [`FragmentStream`] is what a turn consumes: each call to
//! [`FragmentStream::next`] yields the next piece of reply text in arrival
//! order.  Completion is `None`; failure is `Some(Err(_))`, after which the
//! stream is finished.  There is no way to rewind or restart it.

use std::pin::Pin;

use futures::Stream;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::observability::STREAM_CANCELLED;
use crate::types::GenerateContentResponse;
use crate::{Error, Result};

type Inner = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A one-shot stream of text fragments.
pub struct FragmentStream {
    inner: Inner,
    cancel: CancellationToken,
    finished: bool,
    received: usize,
}

impl FragmentStream {
    /// Wrap a stream of text fragments.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            cancel: CancellationToken::new(),
            finished: false,
            received: 0,
        }
    }

    /// Build a fragment stream from raw response chunks.
    ///
    /// Chunks without text are skipped; a blocked prompt or a withheld
    /// candidate becomes [`Error::Blocked`].
    pub fn from_responses<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<GenerateContentResponse>> + Send + 'static,
    {
        let fragments = stream.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => {
                    if let Some(reason) = chunk.block_reason() {
                        return Some(Err(Error::blocked(reason)));
                    }
                    let text = chunk.text();
                    if text.is_empty() { None } else { Some(Ok(text)) }
                }
                Err(err) => Some(Err(err)),
            }
        });
        Self::new(fragments)
    }

    /// A stream over a fixed list of fragments.
    pub fn from_fragments<I, T>(fragments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let fragments: Vec<Result<String>> =
            fragments.into_iter().map(|f| Ok(f.into())).collect();
        Self::new(stream::iter(fragments))
    }

    /// Tie this stream to `token`; cancelling the token ends the stream with
    /// [`Error::Cancelled`] at the next pull.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Number of fragments yielded so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Returns true once the stream has completed, failed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pull the next fragment.
    pub async fn next(&mut self) -> Option<Result<String>> {
        if self.finished {
            return None;
        }
        if self.cancel.is_cancelled() {
            return self.cancelled();
        }
        let item = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return self.cancelled(),
            item = self.inner.next() => item,
        };
        match item {
            Some(Ok(fragment)) => {
                self.received += 1;
                Some(Ok(fragment))
            }
            Some(Err(err)) => {
                self.finished = true;
                Some(Err(err))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    fn cancelled(&mut self) -> Option<Result<String>> {
        self.finished = true;
        STREAM_CANCELLED.click();
        Some(Err(Error::cancelled("reply interrupted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn chunk(value: serde_json::Value) -> Result<GenerateContentResponse> {
        Ok(serde_json::from_value(value).unwrap())
    }

    #[tokio::test]
    async fn yields_in_order_then_completes() {
        let mut fragments = FragmentStream::from_fragments(["Hi", " there!"]);
        assert_eq!(fragments.next().await.unwrap().unwrap(), "Hi");
        assert_eq!(fragments.next().await.unwrap().unwrap(), " there!");
        assert!(fragments.next().await.is_none());
        assert!(fragments.is_finished());
        assert_eq!(fragments.received(), 2);
        // no rewind
        assert!(fragments.next().await.is_none());
    }

    #[tokio::test]
    async fn failure_finishes_the_stream() {
        let mut fragments = FragmentStream::new(stream::iter(vec![
            Ok("partial".to_string()),
            Err(Error::streaming("connection reset", None)),
            Ok("never seen".to_string()),
        ]));
        assert_eq!(fragments.next().await.unwrap().unwrap(), "partial");
        assert!(fragments.next().await.unwrap().is_err());
        assert!(fragments.next().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_stream() {
        let token = CancellationToken::new();
        let pending = stream::iter(vec![Ok("Hi".to_string())]).chain(stream::pending());
        let mut fragments = FragmentStream::new(pending).with_cancellation(token.clone());

        assert_eq!(fragments.next().await.unwrap().unwrap(), "Hi");
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            token.cancel();
        });
        let err = fragments.next().await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(fragments.next().await.is_none());
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn responses_skip_empty_chunks() {
        let chunks = stream::iter(vec![
            chunk(json!({"candidates": [{"content": {"parts": [{"text": "Hi"}]}}]})),
            chunk(json!({"usageMetadata": {"totalTokenCount": 4}})),
            chunk(json!({"candidates": [{"content": {"parts": [{"text": " there!"}]}, "finishReason": "STOP"}]})),
        ]);
        let mut fragments = FragmentStream::from_responses(chunks);
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            text.push_str(&fragment.unwrap());
        }
        assert_eq!(text, "Hi there!");
        assert_eq!(fragments.received(), 2);
    }

    #[tokio::test]
    async fn blocked_prompt_is_an_error() {
        let chunks = stream::iter(vec![chunk(json!({"promptFeedback": {"blockReason": "SAFETY"}}))]);
        let mut fragments = FragmentStream::from_responses(chunks);
        let err = fragments.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Response blocked: SAFETY");
    }
}
