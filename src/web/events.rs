//! A turn as a stream of server-sent events.
//!
//! The handler runs the turn on its own task with a [`ChannelRenderer`];
//! the response body is the receiving end wrapped in a [`TurnEvents`].
//! Dropping the body (the browser went away) cancels the turn.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures::Stream;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures::stream::StreamExt;
use serde_json::json;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::ErrorKind;
use crate::render::Renderer;

/// One event of a streamed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The next piece of the reply.
    Fragment(String),
    /// The turn failed; nothing of it was recorded.
    Error {
        /// How the failure is classified.
        kind: ErrorKind,
        /// What to show the user.
        message: String,
    },
    /// No more events follow.
    Done,
}

impl StreamEvent {
    /// Encode as a server-sent event.
    pub fn into_sse(self) -> Result<Event, axum::Error> {
        match self {
            StreamEvent::Fragment(text) => Event::default()
                .event("fragment")
                .json_data(json!({ "text": text })),
            StreamEvent::Error { kind, message } => Event::default()
                .event("error")
                .json_data(json!({ "kind": kind.to_string(), "message": message })),
            StreamEvent::Done => Ok(Event::default().event("done").data("{}")),
        }
    }
}

/// A [`Renderer`] that forwards fragments into a channel.
///
/// When the receiving side is gone the turn's token is cancelled, so the
/// session stops pulling fragments nobody will see.
pub struct ChannelRenderer {
    tx: UnboundedSender<StreamEvent>,
    cancel: CancellationToken,
}

impl ChannelRenderer {
    /// Forward into `tx`; cancel `cancel` once `tx` is disconnected.
    pub fn new(tx: UnboundedSender<StreamEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    fn send(&mut self, event: StreamEvent) {
        if self.tx.unbounded_send(event).is_err() {
            self.cancel.cancel();
        }
    }
}

impl Renderer for ChannelRenderer {
    fn start_response(&mut self, _: &str) {}

    fn print_text(&mut self, text: &str) {
        self.send(StreamEvent::Fragment(text.to_string()));
    }

    fn print_error(&mut self, error: &str) {
        self.send(StreamEvent::Error {
            kind: ErrorKind::Transient,
            message: error.to_string(),
        });
    }

    fn print_info(&mut self, _: &str) {}

    fn finish_response(&mut self) {}

    fn print_interrupted(&mut self) {}
}

/// The receiving side of a turn; cancels the turn when dropped.
pub struct TurnEvents {
    rx: UnboundedReceiver<StreamEvent>,
    _cancel_on_drop: DropGuard,
}

impl TurnEvents {
    /// Read from `rx`; dropping this cancels `cancel`.
    pub fn new(rx: UnboundedReceiver<StreamEvent>, cancel: CancellationToken) -> Self {
        Self {
            rx,
            _cancel_on_drop: cancel.drop_guard(),
        }
    }
}

impl Stream for TurnEvents {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;

    #[tokio::test]
    async fn fragments_flow_through() {
        let (tx, rx) = mpsc::unbounded();
        let cancel = CancellationToken::new();
        let mut renderer = ChannelRenderer::new(tx, cancel.clone());
        let mut events = TurnEvents::new(rx, cancel.clone());

        renderer.start_response("Aurora");
        renderer.print_text("Hi");
        renderer.print_text(" there!");
        drop(renderer);

        assert_eq!(
            events.next().await,
            Some(StreamEvent::Fragment("Hi".to_string()))
        );
        assert_eq!(
            events.next().await,
            Some(StreamEvent::Fragment(" there!".to_string()))
        );
        assert_eq!(events.next().await, None);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_the_receiver_cancels_the_turn() {
        let (tx, rx) = mpsc::unbounded();
        let cancel = CancellationToken::new();
        let mut renderer = ChannelRenderer::new(tx, cancel.clone());
        let events = TurnEvents::new(rx, cancel.clone());

        drop(events);
        assert!(cancel.is_cancelled());
        renderer.print_text("nobody listens");
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn events_encode() {
        assert!(StreamEvent::Fragment("x".to_string()).into_sse().is_ok());
        assert!(
            StreamEvent::Error {
                kind: ErrorKind::InvalidCredential,
                message: "bad key".to_string(),
            }
            .into_sse()
            .is_ok()
        );
        assert!(StreamEvent::Done.into_sse().is_ok());
    }
}
