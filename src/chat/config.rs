//! Configuration types for the console surface.
//!
//! This module provides CLI argument parsing via `arrrg` and the
//! [`ChatConfig`] that both surfaces use to open a session.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::persona::Persona;
use crate::types::{GenerationConfig, Model};

/// Command-line arguments for the aurora-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Maximum output tokens per reply.
    #[arrrg(optional, "Max output tokens per reply (default: model limit)", "TOKENS")]
    pub max_output_tokens: Option<u32>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature, 0.0 to 2.0 (default: model default)", "TEMP")]
    pub temperature: Option<f32>,

    /// Nucleus sampling.
    #[arrrg(optional, "Top-p sampling value (default: model default)", "P")]
    pub top_p: Option<f32>,

    /// Top-k sampling.
    #[arrrg(optional, "Top-k sampling limit (default: model default)", "K")]
    pub top_k: Option<u32>,

    /// Alternate API endpoint.
    #[arrrg(optional, "Base URL of the Generative Language API", "URL")]
    pub base_url: Option<String>,

    /// Whole-request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

// `arrrg::CommandLine` requires `Eq`; the float fields only permit `PartialEq`.
impl Eq for ChatArgs {}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to use for generating replies.
    pub model: Model,

    /// The persona every request is seeded with.
    pub persona: Persona,

    /// Maximum output tokens per reply; `None` leaves it to the model.
    pub max_output_tokens: Option<u32>,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Optional top-p nucleus sampling value.
    pub top_p: Option<f32>,

    /// Optional top-k sampling limit.
    pub top_k: Option<u32>,

    /// Alternate API base URL.
    pub base_url: Option<String>,

    /// Whole-request timeout.  Only connecting is bounded when unset.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-1.5-flash
    /// - Persona: Aurora
    /// - Sampling: model defaults
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            persona: Persona::aurora(),
            max_output_tokens: None,
            temperature: None,
            top_p: None,
            top_k: None,
            base_url: None,
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the persona.
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Sets the maximum output tokens per reply.
    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the top-k value.
    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The sampling controls sent with each request.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let model = args
            .model
            .map(|s| s.parse::<Model>().unwrap_or(Model::Custom(s)))
            .unwrap_or_default();

        ChatConfig {
            model,
            max_output_tokens: args.max_output_tokens,
            temperature: args.temperature,
            top_p: args.top_p,
            top_k: args.top_k,
            base_url: args.base_url,
            timeout: args.timeout.map(Duration::from_secs),
            use_color: !args.no_color,
            ..ChatConfig::new()
        }
    }
}
