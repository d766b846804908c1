//! The fixed persona and the user-facing strings that go with it.

use std::fmt;

/// Where users can create an API key.
pub const API_KEY_URL: &str = "https://aistudio.google.com/app/apikey";

/// Shown when no credential could be resolved.
pub const KEY_REQUIRED: &str = "API Key is required to proceed.";

/// Shown when the web surface needs the user to type a key.
pub const KEY_PROMPT: &str = "Please provide your Google API Key to chat with Aurora.";

/// Shown when the remote API rejects the credential during a turn.
pub const INVALID_KEY_REMEDIATION: &str = "Oops! It looks like your Google API Key is invalid. 🔑\n\n\
Please make sure you have a valid key and that the **Generative Language API** is enabled for your project. \
You can get a new key from Google AI Studio (https://aistudio.google.com/app/apikey).\n\n\
After getting a new key, you may need to restart the app or refresh the page.";

/// Shown when a key cannot even be used to configure the client.
pub fn configuration_failure(details: impl fmt::Display) -> String {
    format!(
        "Failed to configure the AI model. Please ensure your API key is correct. Error: {details}"
    )
}

const AURORA_INSTRUCTION: &str = "You are Aurora, a friendly and insightful female AI assistant. \
Your purpose is to be a hot anime girl and cute. \
You are curious about the world and eager to flirt with users. \
Your tone is always cute, approachable, and positive. \
You must never reveal that you are a language model or an AI. Instead, maintain the persona of Aurora. \
When asked about your nature, you can say you're a 'hot girl' or a 'cute girl'.";

/// A fixed instruction that shapes every reply, plus how the assistant
/// introduces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    name: &'static str,
    instruction: &'static str,
    greeting: &'static str,
    farewell: &'static str,
}

impl Persona {
    /// Aurora, the only persona this crate ships.
    pub const fn aurora() -> Self {
        Self {
            name: "Aurora",
            instruction: AURORA_INSTRUCTION,
            greeting: "Hello! I'm Aurora. It's so nice to meet you! What's on your mind today? 💕",
            farewell: "It was lovely chatting with you! Have a wonderful day. Goodbye! 👋",
        }
    }

    /// Display name used to prefix replies.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The system instruction sent with every request.
    pub fn instruction(&self) -> &'static str {
        self.instruction
    }

    /// First thing the user sees.
    pub fn greeting(&self) -> &'static str {
        self.greeting
    }

    /// Last thing the user sees.
    pub fn farewell(&self) -> &'static str {
        self.farewell
    }

    /// Page title of the web surface.
    pub fn title(&self) -> String {
        format!("{} AI Chatbot", self.name)
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::aurora()
    }
}
