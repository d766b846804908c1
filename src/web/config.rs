//! Configuration for the web surface.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::{ChatArgs, ChatConfig};
use crate::credential::SecretsStore;
use crate::web::avatar::DEFAULT_AVATAR;
use crate::web::sessions::DEFAULT_SESSION_TTL;

/// Command-line arguments for the aurora-web tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct WebArgs {
    /// Address to bind.
    #[arrrg(optional, "Host address to bind (default: 127.0.0.1)", "HOST")]
    pub host: Option<String>,

    /// Port to listen on.
    #[arrrg(optional, "Port to listen on (default: 8501)", "PORT")]
    pub port: Option<u16>,

    /// Assistant avatar image.
    #[arrrg(optional, "Avatar image (default: aurora_avatar.jpg)", "PATH")]
    pub avatar: Option<String>,

    /// Secrets file.
    #[arrrg(optional, "Secrets file (default: .aurora/secrets.yaml)", "PATH")]
    pub secrets: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-1.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Maximum output tokens per reply.
    #[arrrg(optional, "Max output tokens per reply (default: model limit)", "TOKENS")]
    pub max_output_tokens: Option<u32>,

    /// Alternate API endpoint.
    #[arrrg(optional, "Base URL of the Generative Language API", "URL")]
    pub base_url: Option<String>,

    /// Idle browser sessions are dropped after this many seconds.
    #[arrrg(optional, "Idle session lifetime in seconds (default: 3600)", "SECONDS")]
    pub session_ttl_secs: Option<u64>,
}

/// Resolved configuration of the web surface.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Assistant avatar image.
    pub avatar: PathBuf,
    /// Secrets file consulted before the environment.
    pub secrets: PathBuf,
    /// Idle lifetime of a browser session.
    pub session_ttl: Duration,
    /// Settings of each browser's chat session.
    pub chat: ChatConfig,
}

impl WebConfig {
    /// Default port, the same one the hosted page used.
    pub const DEFAULT_PORT: u16 = 8501;

    /// Creates a new WebConfig with default values.
    pub fn new() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Self::DEFAULT_PORT,
            avatar: PathBuf::from(DEFAULT_AVATAR),
            secrets: PathBuf::from(SecretsStore::DEFAULT_PATH),
            session_ttl: DEFAULT_SESSION_TTL,
            chat: ChatConfig::new(),
        }
    }

    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<WebArgs> for WebConfig {
    fn from(args: WebArgs) -> Self {
        let defaults = WebConfig::new();
        let chat = ChatConfig::from(ChatArgs {
            model: args.model,
            max_output_tokens: args.max_output_tokens,
            base_url: args.base_url,
            no_color: true,
            ..ChatArgs::default()
        });
        WebConfig {
            host: args.host.unwrap_or(defaults.host),
            port: args.port.unwrap_or(defaults.port),
            avatar: args.avatar.map(PathBuf::from).unwrap_or(defaults.avatar),
            secrets: args.secrets.map(PathBuf::from).unwrap_or(defaults.secrets),
            session_ttl: args
                .session_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            chat,
        }
    }
}
