//! Shared fixtures for session integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sfconnect::testing::MockTransport;
use sfconnect::{
    HttpRequest, HttpResponse, Record, Session, SessionConfig, SessionState, Subscriber,
    Transport, TransportError,
};
use std::sync::{Arc, Mutex};

pub const GRANT_BODY: &str = r#"{"access_token": "T", "instance_url": "U", "token_type": "Bearer"}"#;

pub const TWO_RECORDS: &str =
    r#"{"totalSize": 2, "done": true, "records": [{"Id": "1", "Name": "A"}, {"Id": "2", "Name": "B"}]}"#;

pub fn config() -> SessionConfig {
    SessionConfig::new(
        "https://login.example.com/services/oauth2/token",
        "client-secret",
        "client-id",
        "security-token",
        "password",
        "v29.0",
        true,
    )
}

/// Collects every message delivered to it.
#[derive(Clone, Default)]
pub struct Recorder {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl Subscriber for Recorder {
    fn on_event(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Configured session with a recorder subscribed.
pub fn session() -> (Session, Arc<MockTransport>, Recorder) {
    let transport = Arc::new(MockTransport::new());
    let session = Session::with_config(config(), transport.clone());
    let recorder = Recorder::default();
    session.subscribe(Arc::new(recorder.clone()));
    (session, transport, recorder)
}

/// Logged-in session; the recorder and request log start empty.
pub async fn ready_session() -> (Session, Arc<MockTransport>, Recorder) {
    let (session, transport, recorder) = session();
    transport.enqueue_body(GRANT_BODY);
    session.login("user@example.com", "pw").unwrap().await;
    assert_eq!(session.state(), SessionState::Ready);
    recorder.clear();
    transport.clear_requests();
    (session, transport, recorder)
}

/// Ready session whose current result holds the two records of `TWO_RECORDS`;
/// the recorder and request log start empty.
pub async fn session_with_result() -> (Session, Arc<MockTransport>, Recorder) {
    let (session, transport, recorder) = ready_session().await;
    transport.enqueue_body(TWO_RECORDS);
    session.query_all("Account", &["Id", "Name"], true).unwrap().await;
    recorder.clear();
    transport.clear_requests();
    (session, transport, recorder)
}

pub fn record(fields: &[(&str, &str)]) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Transport that panics on every request whose URL contains `trigger`
/// and answers the rest from a script.
pub struct PanickingTransport {
    trigger: &'static str,
    script: MockTransport,
}

impl PanickingTransport {
    pub fn new(trigger: &'static str) -> Self {
        Self {
            trigger,
            script: MockTransport::new(),
        }
    }

    pub fn enqueue_body(&self, body: impl Into<String>) {
        self.script.enqueue_body(body);
    }
}

#[async_trait]
impl Transport for PanickingTransport {
    async fn send_http(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.url.contains(self.trigger) {
            panic!("transport blew up on {}", request.url);
        }
        self.script.send_http(request).await
    }
}
