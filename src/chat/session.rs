//! Core chat session management.
//!
//! A [`ChatSession`] binds a persona, a model and the conversation history.
//! Each call to [`ChatSession::send_streaming`] is one turn: the user message
//! is appended, the reply is streamed to a [`Renderer`], and the reply is
//! appended once it completed.  A failed or interrupted turn leaves the
//! history exactly as it was before the turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::chat::config::ChatConfig;
use crate::chat::history::{History, Turn};
use crate::credential::Credential;
use crate::fragments::FragmentStream;
use crate::observability::{CHAT_TURN_DURATION, CHAT_TURN_FAILURES, CHAT_TURNS};
use crate::persona::{INVALID_KEY_REMEDIATION, Persona};
use crate::render::Renderer;
use crate::types::{GenerateContentRequest, GenerationConfig, Model};
use crate::{Error, ErrorKind, GenerativeAi, Result, TracingLogger};

/// Something that can continue a conversation.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// The model replies are requested from.
    fn model(&self) -> &Model;

    /// Start streaming the reply to the last user turn in `history`.
    async fn stream_reply(&self, persona: &Persona, history: &History) -> Result<FragmentStream>;
}

#[async_trait::async_trait]
impl ChatModel for Box<dyn ChatModel> {
    fn model(&self) -> &Model {
        (**self).model()
    }

    async fn stream_reply(&self, persona: &Persona, history: &History) -> Result<FragmentStream> {
        (**self).stream_reply(persona, history).await
    }
}

/// A [`ChatModel`] backed by the Generative Language API.
#[derive(Debug, Clone)]
pub struct GenerativeModel {
    client: GenerativeAi,
    model: Model,
    generation: GenerationConfig,
}

impl GenerativeModel {
    /// Request replies from `model` through `client`.
    pub fn new(client: GenerativeAi, model: Model) -> Self {
        Self {
            client,
            model,
            generation: GenerationConfig::default(),
        }
    }

    /// Build the API client for `credential` and bind the configured model
    /// and sampling controls.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the client cannot be built, e.g. the
    /// credential cannot be sent in a header or the base URL does not parse.
    pub fn connect(credential: &Credential, config: &ChatConfig) -> Result<Self> {
        let client = GenerativeAi::with_options(
            credential.expose(),
            config.base_url.as_deref(),
            config.timeout,
        )?
        .with_logger(Arc::new(TracingLogger));
        Ok(Self::new(client, config.model.clone())
            .with_generation_config(config.generation_config()))
    }

    /// Sets the sampling controls sent with every request.
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// The request for the next reply.
    pub fn request(&self, persona: &Persona, history: &History) -> GenerateContentRequest {
        GenerateContentRequest::new(history.to_contents())
            .with_system_instruction(persona.instruction())
            .with_generation_config(self.generation.clone())
    }
}

#[async_trait::async_trait]
impl ChatModel for GenerativeModel {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn stream_reply(&self, persona: &Persona, history: &History) -> Result<FragmentStream> {
        let request = self.request(persona, history);
        let chunks = self
            .client
            .stream_generate_content(&self.model, &request)
            .await?;
        Ok(FragmentStream::from_responses(chunks))
    }
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The full reply, as recorded in history.
    pub reply: String,
    /// Number of fragments the reply arrived in.
    pub fragments: usize,
    /// Wall-clock time from send to the last fragment.
    pub duration: Duration,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of turns in the history.
    pub turn_count: usize,
    /// Turns that completed and were recorded.
    pub turns_completed: u64,
    /// Turns that failed or were interrupted.
    pub turns_failed: u64,
    /// Fragments received across completed turns.
    pub fragments_received: u64,
}

/// A chat session that manages conversation state and API interactions.
pub struct ChatSession<M: ChatModel = GenerativeModel> {
    model: M,
    persona: Persona,
    history: History,
    turns_completed: u64,
    turns_failed: u64,
    fragments_received: u64,
}

impl ChatSession<GenerativeModel> {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: GenerativeAi, config: &ChatConfig) -> Self {
        let model = GenerativeModel::new(client, config.model.clone())
            .with_generation_config(config.generation_config());
        Self::with_model(model, config.persona)
    }
}

impl<M: ChatModel> ChatSession<M> {
    /// Creates a new chat session around any [`ChatModel`].
    pub fn with_model(model: M, persona: Persona) -> Self {
        Self {
            model,
            persona,
            history: History::new(),
            turns_completed: 0,
            turns_failed: 0,
            fragments_received: 0,
        }
    }

    /// Sends a user message and streams the reply.
    ///
    /// Input that is empty after trimming is ignored: nothing is sent or
    /// recorded and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the stream fails, the reply is
    /// empty, or `cancel` fires before the reply completed.  In every case
    /// the history is rolled back to its length before the call.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
    ) -> Result<Option<TurnOutcome>> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Ok(None);
        }

        let previous_len = self.history.len();
        self.history.push(Turn::user(user_input))?;

        let start = Instant::now();
        match self.stream_turn(renderer, cancel, start).await {
            Ok(outcome) => {
                self.history.push(Turn::assistant(outcome.reply.clone()))?;
                self.turns_completed += 1;
                self.fragments_received += outcome.fragments as u64;
                CHAT_TURNS.click();
                CHAT_TURN_DURATION.add(outcome.duration.as_secs_f64());
                tracing::debug!(
                    fragments = outcome.fragments,
                    duration_ms = outcome.duration.as_millis() as u64,
                    "turn completed"
                );
                Ok(Some(outcome))
            }
            Err(err) => {
                self.history.rollback(previous_len);
                self.turns_failed += 1;
                CHAT_TURN_FAILURES.click();
                tracing::warn!(kind = %err.kind(), error = %err, "turn failed");
                Err(err)
            }
        }
    }

    async fn stream_turn(
        &self,
        renderer: &mut dyn Renderer,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<TurnOutcome> {
        renderer.start_response(self.persona.name());
        let fragments = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled("reply interrupted")),
            fragments = self.model.stream_reply(&self.persona, &self.history) => fragments?,
        };
        let mut fragments = fragments.with_cancellation(cancel.clone());

        let mut reply = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            renderer.print_text(&fragment);
            reply.push_str(&fragment);
        }
        if reply.is_empty() {
            return Err(Error::streaming("the model returned an empty reply", None));
        }
        renderer.finish_response();

        Ok(TurnOutcome {
            reply,
            fragments: fragments.received(),
            duration: start.elapsed(),
        })
    }

    /// The conversation so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The persona replies are shaped by.
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Continue the conversation with a different model.
    pub fn set_model(&mut self, model: M) {
        self.model = model;
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        self.model.model()
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.model.model().clone(),
            turn_count: self.history.len(),
            turns_completed: self.turns_completed,
            turns_failed: self.turns_failed,
            fragments_received: self.fragments_received,
        }
    }
}

/// Configure the API client with `credential` and open an empty session.
///
/// # Errors
///
/// See [`GenerativeModel::connect`].
pub fn init_session(credential: &Credential, config: &ChatConfig) -> Result<ChatSession> {
    let model = GenerativeModel::connect(credential, config)?;
    tracing::debug!(model = %config.model, source = %credential.source(), "session opened");
    Ok(ChatSession::with_model(model, config.persona))
}

/// What to tell the user when a turn fails.
pub fn turn_error_message(err: &Error) -> String {
    match err.kind() {
        ErrorKind::InvalidCredential => INVALID_KEY_REMEDIATION.to_string(),
        _ => format!("An unexpected error occurred: {err}"),
    }
}
