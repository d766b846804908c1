//! The web chat surface.
//!
//! One page, backed by a small JSON API and a server-sent-event stream per
//! turn.  Browsers are kept apart by a session cookie; each browser gets its
//! own [`ChatSession`](crate::chat::ChatSession).
//!
//! - `GET /` the chat page
//! - `GET /avatar` the assistant's avatar image
//! - `GET /api/session` title, greeting, history and whether a key is needed
//! - `POST /api/credential` supply a key for this browser
//! - `POST /api/chat` send a message; the reply streams back as events

mod avatar;
mod config;
mod events;
mod page;
mod routes;
mod sessions;
mod state;

pub use avatar::{AvatarAsset, DEFAULT_AVATAR, USER_AVATAR};
pub use config::{WebArgs, WebConfig};
pub use events::{ChannelRenderer, StreamEvent, TurnEvents};
pub use routes::{router, serve};
pub use sessions::{
    BrowserChat, DEFAULT_SESSION_TTL, SESSION_COOKIE, SessionStore, WebSession, session_cookie,
    session_id,
};
pub use state::{AppState, GenerativeConnector, ModelConnector};
