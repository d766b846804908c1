//! Client and session tests against a local stand-in for the remote API.

mod common;

use aurora::chat::{ChatConfig, Renderer, TurnRole, init_session, turn_error_message};
use aurora::persona::INVALID_KEY_REMEDIATION;
use aurora::{
    Credential, CredentialSource, ErrorKind, FragmentStream, GenerateContentRequest,
    GenerativeAi, KnownModel, Model,
};
use common::{BAD_KEY, GOOD_KEY, QUOTA_KEY, SILENT_KEY, start_stub};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn client(base_url: &str, key: &str) -> GenerativeAi {
    assert_ok!(GenerativeAi::with_options(key, Some(base_url), None))
}

fn hello() -> GenerateContentRequest {
    GenerateContentRequest::new(vec![aurora::Content::new(aurora::Role::User, "Hello")])
        .with_system_instruction("Be brief.")
}

fn config(base_url: &str) -> ChatConfig {
    ChatConfig::new().with_base_url(Some(base_url.to_string()))
}

#[derive(Default)]
struct Transcript {
    text: String,
}

impl Renderer for Transcript {
    fn start_response(&mut self, speaker: &str) {
        self.text.push_str(speaker);
        self.text.push_str(": ");
    }

    fn print_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn print_error(&mut self, _: &str) {}

    fn print_info(&mut self, _: &str) {}

    fn finish_response(&mut self) {
        self.text.push('\n');
    }

    fn print_interrupted(&mut self) {}
}

#[tokio::test]
async fn streams_fragments_in_order() {
    let stub = start_stub().await;
    let client = client(&stub.base_url, GOOD_KEY);
    let model = Model::Known(KnownModel::Gemini15Flash);

    let chunks = assert_ok!(client.stream_generate_content(&model, &hello()).await);
    let mut fragments = FragmentStream::from_responses(chunks);
    let mut received = Vec::new();
    while let Some(fragment) = fragments.next().await {
        received.push(assert_ok!(fragment));
    }
    assert_eq!(received, vec!["Hi".to_string(), " there!".to_string()]);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].call, "gemini-1.5-flash:streamGenerateContent");
    assert_eq!(requests[0].key, GOOD_KEY);
    assert_eq!(
        requests[0].body["systemInstruction"]["parts"][0]["text"],
        "Be brief."
    );
    assert_eq!(requests[0].body["contents"][0]["role"], "user");
}

#[tokio::test]
async fn complete_response() {
    let stub = start_stub().await;
    let client = client(&stub.base_url, GOOD_KEY);
    let response = assert_ok!(
        client
            .generate_content(&Model::Known(KnownModel::Gemini15Flash), &hello())
            .await
    );
    assert_eq!(response.text(), "Hi there!");
    assert_eq!(stub.requests()[0].call, "gemini-1.5-flash:generateContent");
}

#[tokio::test]
async fn invalid_key_is_an_invalid_credential() {
    let stub = start_stub().await;
    let client = client(&stub.base_url, BAD_KEY);
    let Err(err) = client
        .stream_generate_content(&Model::default(), &hello())
        .await
    else {
        panic!("the stream should have been rejected");
    };
    assert!(err.is_invalid_argument());
    assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    assert_eq!(err.status_code(), Some(400));
}

#[tokio::test]
async fn quota_is_transient() {
    let stub = start_stub().await;
    let client = client(&stub.base_url, QUOTA_KEY);
    let Err(err) = client
        .stream_generate_content(&Model::default(), &hello())
        .await
    else {
        panic!("the stream should have been rejected");
    };
    assert!(err.is_rate_limit());
    assert_eq!(err.kind(), ErrorKind::Transient);
}

#[tokio::test]
async fn session_carries_the_conversation() {
    let stub = start_stub().await;
    let credential = Credential::new(GOOD_KEY, CredentialSource::Environment);
    let mut session = assert_ok!(init_session(&credential, &config(&stub.base_url)));
    let mut transcript = Transcript::default();
    let cancel = CancellationToken::new();

    let outcome = assert_ok!(
        session
            .send_streaming("Hello", &mut transcript, &cancel)
            .await
    );
    assert_eq!(outcome.map(|o| o.reply), Some("Hi there!".to_string()));
    assert_ok!(
        session
            .send_streaming("How are you?", &mut transcript, &cancel)
            .await
    );
    assert_eq!(transcript.text, "Aurora: Hi there!\nAurora: Hi there!\n");

    let roles: Vec<TurnRole> = session.history().turns().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            TurnRole::User,
            TurnRole::Assistant,
            TurnRole::User,
            TurnRole::Assistant
        ]
    );

    // the second request replays the first exchange, with the persona as
    // the system instruction rather than a turn
    let requests = stub.requests();
    let second = &requests[1].body;
    let contents = second["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "How are you?");
    assert!(
        second["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("You are Aurora")
    );
}

#[tokio::test]
async fn rejected_key_leaves_history_untouched() {
    let stub = start_stub().await;
    let credential = Credential::new(BAD_KEY, CredentialSource::Interactive);
    let mut session = assert_ok!(init_session(&credential, &config(&stub.base_url)));
    let mut transcript = Transcript::default();

    let err = assert_err!(
        session
            .send_streaming("Hello", &mut transcript, &CancellationToken::new())
            .await
    );
    assert_eq!(turn_error_message(&err), INVALID_KEY_REMEDIATION);
    assert!(session.history().is_empty());
    assert_eq!(session.stats().turns_failed, 1);
}

#[tokio::test]
async fn empty_input_never_reaches_the_api() {
    let stub = start_stub().await;
    let credential = Credential::new(GOOD_KEY, CredentialSource::Environment);
    let mut session = assert_ok!(init_session(&credential, &config(&stub.base_url)));
    let mut transcript = Transcript::default();

    let outcome = assert_ok!(
        session
            .send_streaming("  \t ", &mut transcript, &CancellationToken::new())
            .await
    );
    assert!(outcome.is_none());
    assert!(stub.requests().is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn reply_without_text_is_not_recorded() {
    let stub = start_stub().await;
    let credential = Credential::new(SILENT_KEY, CredentialSource::Environment);
    let mut session = assert_ok!(init_session(&credential, &config(&stub.base_url)));
    let mut transcript = Transcript::default();

    let err = assert_err!(
        session
            .send_streaming("Hello", &mut transcript, &CancellationToken::new())
            .await
    );
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(session.history().is_empty());
}
