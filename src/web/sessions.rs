//! Per-browser session state.
//!
//! Each browser is identified by the `aurora_session` cookie.  Its
//! [`WebSession`] lives behind an async mutex so that one turn at a time can
//! hold it while streaming; a second turn on the same session finds the
//! mutex taken and is turned away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use tokio::time::Instant;
use uuid::Uuid;

use crate::chat::{ChatModel, ChatSession, History};
use crate::observability::{WEB_SESSIONS_CREATED, WEB_SESSIONS_EXPIRED};
use crate::persona::Persona;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "aurora_session";

/// How long an idle browser session is kept.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// The chat session behind one browser.
pub type BrowserChat = ChatSession<Box<dyn ChatModel>>;

/// State of one browser session.
#[derive(Default)]
pub struct WebSession {
    chat: Option<BrowserChat>,
}

impl WebSession {
    /// A session that still needs a credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that can chat right away.
    pub fn with_chat(chat: BrowserChat) -> Self {
        Self { chat: Some(chat) }
    }

    /// Returns true until a credential was supplied.
    pub fn needs_credential(&self) -> bool {
        self.chat.is_none()
    }

    /// Start chatting through `model`.  A session that was already
    /// connected keeps its history and only swaps the model.
    pub fn connect(&mut self, model: Box<dyn ChatModel>, persona: Persona) {
        if let Some(chat) = &mut self.chat {
            chat.set_model(model);
        } else {
            self.chat = Some(ChatSession::with_model(model, persona));
        }
    }

    /// The chat session, once connected.
    pub fn chat(&self) -> Option<&BrowserChat> {
        self.chat.as_ref()
    }

    /// The chat session for a turn.
    pub fn chat_mut(&mut self) -> Option<&mut BrowserChat> {
        self.chat.as_mut()
    }

    /// The conversation so far; empty before connecting.
    pub fn history(&self) -> History {
        self.chat
            .as_ref()
            .map(|chat| chat.history().clone())
            .unwrap_or_default()
    }
}

struct Entry {
    session: Arc<tokio::sync::Mutex<WebSession>>,
    last_seen: Instant,
}

/// All live browser sessions.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    /// An empty store that forgets sessions idle for longer than `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no browser has a live session.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a live session and mark it as used.
    pub fn get(&self, id: &Uuid) -> Option<Arc<tokio::sync::Mutex<WebSession>>> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        sessions.get_mut(id).map(|entry| {
            entry.last_seen = Instant::now();
            Arc::clone(&entry.session)
        })
    }

    /// Look up the session `id`, or create one with `make` when `id` is
    /// absent, unknown or expired.  The returned flag is true for a new
    /// session, whose id must then be handed to the browser.
    pub fn get_or_create<F>(
        &self,
        id: Option<Uuid>,
        make: F,
    ) -> (Uuid, Arc<tokio::sync::Mutex<WebSession>>, bool)
    where
        F: FnOnce() -> WebSession,
    {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions);
        if let Some(id) = id
            && let Some(entry) = sessions.get_mut(&id)
        {
            entry.last_seen = Instant::now();
            return (id, Arc::clone(&entry.session), false);
        }
        let id = Uuid::new_v4();
        let session = Arc::new(tokio::sync::Mutex::new(make()));
        sessions.insert(
            id,
            Entry {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        WEB_SESSIONS_CREATED.click();
        tracing::debug!(session = %id, "browser session created");
        (id, session, true)
    }

    fn evict_expired(&self, sessions: &mut HashMap<Uuid, Entry>) {
        let ttl = self.ttl;
        sessions.retain(|id, entry| {
            let live = entry.last_seen.elapsed() <= ttl;
            if !live {
                WEB_SESSIONS_EXPIRED.click();
                tracing::debug!(session = %id, "browser session expired");
            }
            live
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

/// The session id carried by the request's cookies, if any.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// The `Set-Cookie` value handing `id` to the browser.
pub fn session_cookie(id: &Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Strict")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_round_trip() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; other=1")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));
        assert!(session_cookie(&id).starts_with(&format!("{SESSION_COOKIE}={id};")));
    }

    #[test]
    fn garbage_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("aurora_session=not-a-uuid"));
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::default();
        let (first, _, created) = store.get_or_create(None, WebSession::new);
        assert!(created);
        let (second, _, created) = store.get_or_create(None, WebSession::new);
        assert!(created);
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);

        let (again, _, created) = store.get_or_create(Some(first), WebSession::new);
        assert!(!created);
        assert_eq!(again, first);
        assert!(store.get(&second).is_some());
    }

    #[tokio::test]
    async fn unknown_id_gets_a_fresh_session() {
        let store = SessionStore::default();
        let stale = Uuid::new_v4();
        let (id, _, created) = store.get_or_create(Some(stale), WebSession::new);
        assert!(created);
        assert_ne!(id, stale);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (id, _, _) = store.get_or_create(None, WebSession::new);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(store.get(&id).is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn busy_session_cannot_be_locked_twice() {
        let store = SessionStore::default();
        let (_, session, _) = store.get_or_create(None, WebSession::new);
        let guard = Arc::clone(&session).try_lock_owned().unwrap();
        assert!(session.try_lock().is_err());
        drop(guard);
        assert!(session.try_lock().is_ok());
    }
}
