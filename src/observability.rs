use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("aurora.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("aurora.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("aurora.client.request_duration_seconds");

pub(crate) static STREAM_CHUNKS: Counter = Counter::new("aurora.stream.chunks");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("aurora.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("aurora.stream.bytes");
pub(crate) static STREAM_CANCELLED: Counter = Counter::new("aurora.stream.cancelled");
pub(crate) static STREAM_TTFB: Moments = Moments::new("aurora.stream.ttfb_seconds");

pub(crate) static CHAT_TURNS: Counter = Counter::new("aurora.chat.turns");
pub(crate) static CHAT_TURN_FAILURES: Counter = Counter::new("aurora.chat.turn_failures");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("aurora.chat.turn_duration_seconds");

pub(crate) static CREDENTIAL_MISSES: Counter = Counter::new("aurora.credential.misses");

pub(crate) static WEB_SESSIONS_CREATED: Counter = Counter::new("aurora.web.sessions_created");
pub(crate) static WEB_SESSIONS_EXPIRED: Counter = Counter::new("aurora.web.sessions_expired");
pub(crate) static WEB_BUSY_REJECTIONS: Counter = Counter::new("aurora.web.busy_rejections");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_CHUNKS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_CANCELLED);
    collector.register_moments(&STREAM_TTFB);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_TURN_FAILURES);
    collector.register_moments(&CHAT_TURN_DURATION);

    collector.register_counter(&CREDENTIAL_MISSES);

    collector.register_counter(&WEB_SESSIONS_CREATED);
    collector.register_counter(&WEB_SESSIONS_EXPIRED);
    collector.register_counter(&WEB_BUSY_REJECTIONS);
}
