//! A local stand-in for the Generative Language API.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Rejected with 400 INVALID_ARGUMENT, the way an invalid key is.
pub const BAD_KEY: &str = "bad-key";
/// Rejected with 429 RESOURCE_EXHAUSTED.
pub const QUOTA_KEY: &str = "quota-key";
/// Streams the first fragment and then never finishes.
pub const SLOW_KEY: &str = "slow-key";
/// Streams a reply without any text.
pub const SILENT_KEY: &str = "silent-key";
/// Any other key is accepted.
pub const GOOD_KEY: &str = "good-key";

/// One request the stand-in received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub call: String,
    pub key: String,
    pub body: Value,
}

pub struct StubApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubApi {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn start_stub() -> StubApi {
    let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
    let app = Router::new()
        .route("/v1beta/models/{call}", post(handle))
        .with_state(Arc::clone(&requests));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StubApi {
        base_url: format!("http://{addr}/v1beta/"),
        requests,
    }
}

fn chunk(text: &str, finish: Option<&str>) -> Value {
    let mut candidate = json!({
        "content": {"role": "model", "parts": [{"text": text}]},
        "index": 0
    });
    if let Some(finish) = finish {
        candidate["finishReason"] = json!(finish);
    }
    json!({"candidates": [candidate], "modelVersion": "gemini-1.5-flash-002"})
}

fn frame(value: &Value) -> String {
    format!("data: {value}\r\n\r\n")
}

fn api_error(status: StatusCode, message: &str, code: &str, reason: Option<&str>) -> Response {
    let details: Vec<Value> = reason
        .map(|reason| {
            vec![json!({
                "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                "reason": reason,
                "domain": "googleapis.com"
            })]
        })
        .unwrap_or_default();
    let body = json!({
        "error": {
            "code": status.as_u16(),
            "message": message,
            "status": code,
            "details": details
        }
    });
    (status, Json(body)).into_response()
}

async fn handle(
    State(requests): State<Arc<Mutex<Vec<Recorded>>>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    requests.lock().unwrap().push(Recorded {
        call: call.clone(),
        key: key.clone(),
        body,
    });

    match key.as_str() {
        BAD_KEY => {
            return api_error(
                StatusCode::BAD_REQUEST,
                "API key not valid. Please pass a valid API key.",
                "INVALID_ARGUMENT",
                Some("API_KEY_INVALID"),
            );
        }
        QUOTA_KEY => {
            return api_error(
                StatusCode::TOO_MANY_REQUESTS,
                "Resource has been exhausted (e.g. check quota).",
                "RESOURCE_EXHAUSTED",
                None,
            );
        }
        _ => {}
    }

    if call.ends_with(":streamGenerateContent") {
        let body = match key.as_str() {
            SLOW_KEY => {
                let first = Ok::<_, std::io::Error>(Bytes::from(frame(&chunk("Hi", None))));
                Body::from_stream(stream::iter(vec![first]).chain(stream::pending()))
            }
            SILENT_KEY => Body::from(frame(&json!({
                "candidates": [{"content": {"role": "model", "parts": []}, "finishReason": "STOP"}]
            }))),
            _ => Body::from(format!(
                "{}{}",
                frame(&chunk("Hi", None)),
                frame(&chunk(" there!", Some("STOP")))
            )),
        };
        ([(CONTENT_TYPE, "text/event-stream")], body).into_response()
    } else if call.ends_with(":generateContent") {
        Json(chunk("Hi there!", Some("STOP"))).into_response()
    } else {
        api_error(
            StatusCode::NOT_FOUND,
            "Method not found.",
            "NOT_FOUND",
            None,
        )
    }
}
