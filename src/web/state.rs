use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::chat::{ChatConfig, ChatModel, ChatSession, GenerativeModel};
use crate::credential::Credential;
use crate::persona::Persona;
use crate::web::avatar::AvatarAsset;
use crate::web::sessions::{BrowserChat, SessionStore, WebSession};

/// Turns a credential into a model a browser session can chat with.
pub trait ModelConnector: Send + Sync {
    /// Connect with `credential`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the credential cannot be used.
    fn connect(&self, credential: &Credential) -> Result<Box<dyn ChatModel>>;
}

/// Connects to the Generative Language API.
#[derive(Debug, Clone)]
pub struct GenerativeConnector {
    config: ChatConfig,
}

impl GenerativeConnector {
    /// Connect every session with `config`.
    pub fn new(config: ChatConfig) -> Self {
        Self { config }
    }
}

impl ModelConnector for GenerativeConnector {
    fn connect(&self, credential: &Credential) -> Result<Box<dyn ChatModel>> {
        Ok(Box::new(GenerativeModel::connect(credential, &self.config)?))
    }
}

struct Shared {
    persona: Persona,
    avatar: AvatarAsset,
    sessions: SessionStore,
    connector: Arc<dyn ModelConnector>,
    credential: Option<Credential>,
}

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppState {
    shared: Arc<Shared>,
}

impl AppState {
    /// Build the state.
    ///
    /// `credential` is what the server resolved at startup; when it is
    /// `None` every browser is asked for its own key.
    pub fn new(
        persona: Persona,
        avatar: AvatarAsset,
        connector: Arc<dyn ModelConnector>,
        credential: Option<Credential>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                persona,
                avatar,
                sessions: SessionStore::new(session_ttl),
                connector,
                credential,
            }),
        }
    }

    /// The persona every session uses.
    pub fn persona(&self) -> &Persona {
        &self.shared.persona
    }

    /// The assistant's avatar.
    pub fn avatar(&self) -> &AvatarAsset {
        &self.shared.avatar
    }

    /// Live browser sessions.
    pub fn sessions(&self) -> &SessionStore {
        &self.shared.sessions
    }

    /// Connect a model for `credential`.
    pub fn connect(&self, credential: &Credential) -> Result<Box<dyn ChatModel>> {
        self.shared.connector.connect(credential)
    }

    /// A fresh browser session, already connected when the server has a
    /// credential of its own.
    pub fn open_session(&self) -> WebSession {
        let Some(credential) = &self.shared.credential else {
            return WebSession::new();
        };
        match self.connect(credential) {
            Ok(model) => WebSession::with_chat(self.chat(model)),
            Err(err) => {
                tracing::warn!(error = %err, "server credential unusable; asking the browser");
                WebSession::new()
            }
        }
    }

    fn chat(&self, model: Box<dyn ChatModel>) -> BrowserChat {
        ChatSession::with_model(model, self.shared.persona)
    }
}
