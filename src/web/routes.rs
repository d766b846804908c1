use std::future::Future;

use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::channel::mpsc;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::chat::{Turn, turn_error_message};
use crate::credential::{CredentialResolver, InteractivePrompt};
use crate::observability::WEB_BUSY_REJECTIONS;
use crate::persona::{KEY_PROMPT, configuration_failure};
use crate::web::events::{ChannelRenderer, StreamEvent, TurnEvents};
use crate::web::page;
use crate::web::sessions::{session_cookie, session_id};
use crate::web::state::AppState;
use crate::{Error, ErrorKind, Result};

const BUSY: &str = "Aurora is still replying to your previous message.";

/// The web surface's routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/avatar", get(avatar))
        .route("/api/session", get(session_info))
        .route("/api/credential", post(set_credential))
        .route("/api/chat", post(chat))
        .with_state(state)
}

/// Serve the web surface on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "serving the chat page");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| Error::io("web server failed", err))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render(state.persona()))
}

async fn avatar(State(state): State<AppState>) -> impl IntoResponse {
    let avatar = state.avatar();
    ([(CONTENT_TYPE, avatar.content_type())], avatar.bytes())
}

#[derive(Serialize)]
struct SessionInfo {
    title: String,
    greeting: &'static str,
    needs_credential: bool,
    history: Vec<Turn>,
}

async fn session_info(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, session, created) = state
        .sessions()
        .get_or_create(session_id(&headers), || state.open_session());
    let session = session.lock().await;
    let info = SessionInfo {
        title: state.persona().title(),
        greeting: state.persona().greeting(),
        needs_credential: session.needs_credential(),
        history: session.history().turns().to_vec(),
    };
    with_cookie(Json(info).into_response(), &id, created)
}

#[derive(Deserialize)]
struct CredentialForm {
    key: String,
}

async fn set_credential(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<CredentialForm>,
) -> Response {
    let (id, session, created) = state
        .sessions()
        .get_or_create(session_id(&headers), || state.open_session());
    let connected = CredentialResolver::new()
        .with_provider(InteractivePrompt::answered(form.key))
        .resolve()
        .and_then(|credential| state.connect(&credential));
    let response = match connected {
        Ok(model) => {
            session.lock().await.connect(model, *state.persona());
            tracing::info!(session = %id, "browser supplied a credential");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) if err.kind() == ErrorKind::Configuration => {
            error_response(StatusCode::BAD_REQUEST, &configuration_failure(&err))
        }
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    };
    with_cookie(response, &id, created)
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.message.trim().is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    let (id, session, created) = state
        .sessions()
        .get_or_create(session_id(&headers), || state.open_session());
    let Ok(mut session) = session.try_lock_owned() else {
        WEB_BUSY_REJECTIONS.click();
        return with_cookie(error_response(StatusCode::CONFLICT, BUSY), &id, created);
    };
    if session.needs_credential() {
        return with_cookie(
            error_response(StatusCode::UNAUTHORIZED, KEY_PROMPT),
            &id,
            created,
        );
    }

    let (tx, rx) = mpsc::unbounded();
    let cancel = CancellationToken::new();
    let mut renderer = ChannelRenderer::new(tx.clone(), cancel.clone());
    let token = cancel.clone();
    tokio::spawn(async move {
        if let Some(chat) = session.chat_mut() {
            match chat
                .send_streaming(&request.message, &mut renderer, &token)
                .await
            {
                Ok(_) => {}
                Err(err) if err.is_cancelled() => {
                    tracing::debug!(session = %id, "browser left during the reply");
                }
                Err(err) => {
                    let _ = tx.unbounded_send(StreamEvent::Error {
                        kind: err.kind(),
                        message: turn_error_message(&err),
                    });
                }
            }
        }
        let _ = tx.unbounded_send(StreamEvent::Done);
    });

    let events = TurnEvents::new(rx, cancel).map(StreamEvent::into_sse);
    let response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    with_cookie(response, &id, created)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn with_cookie(mut response: Response, id: &Uuid, created: bool) -> Response {
    if created && let Ok(value) = HeaderValue::from_str(&session_cookie(id)) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}
