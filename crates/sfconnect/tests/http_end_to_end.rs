//! Full login, query and write flow against a mock REST API over HTTP

mod common;

use common::{Recorder, record};
use pretty_assertions::assert_eq;
use serde_json::json;
use sfconnect::{ErrorKind, HttpTransport, Session, SessionConfig, SessionState};
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SessionConfig {
    SessionConfig::builder()
        .auth_endpoint(format!("{}/services/oauth2/token", server.uri()))
        .client_id("client-id")
        .client_secret("client-secret")
        .security_token("security-token")
        .reports_enabled(true)
        .build()
        .unwrap()
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "00Dxx!token",
            "instance_url": server.uri(),
            "token_type": "Bearer",
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn http_session(server: &MockServer) -> (Session, Recorder) {
    let transport = Arc::new(HttpTransport::new().unwrap());
    let session = Session::with_config(config_for(server), transport);
    let recorder = Recorder::default();
    session.subscribe(Arc::new(recorder.clone()));
    (session, recorder)
}

#[tokio::test]
async fn test_login_and_query_over_http() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/services/data/v29.0/query"))
        .and(query_param("q", "SELECT Id, Name FROM Account"))
        .and(header("Authorization", "Bearer 00Dxx!token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 2,
            "done": true,
            "records": [
                {"attributes": {"type": "Account"}, "Id": "001A", "Name": "Acme"},
                {"attributes": {"type": "Account"}, "Id": "001B", "Name": "Globex"},
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, recorder) = http_session(&server);
    session.login("user@example.com", "pw").unwrap().await;
    assert_eq!(session.status().instance_url, Some(server.uri()));

    session
        .query_all("Account", &["Id", "Name"], true)
        .unwrap()
        .await;

    assert_eq!(session.last_error(), ErrorKind::None);
    let result = session.current_result().unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.record_at(1).unwrap()["Name"], "Globex");
    assert_eq!(
        recorder.messages(),
        vec![
            "LOGIN REQUESTED",
            "LOGIN SUCCESSFUL",
            "QUERY REQUESTED",
            "QUERY SUCCESSFUL",
        ]
    );
}

#[tokio::test]
async fn test_rejected_login_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "authentication failure",
        })))
        .mount(&server)
        .await;

    let (session, recorder) = http_session(&server);
    session.login("user@example.com", "wrong").unwrap().await;

    assert_eq!(session.state(), SessionState::Created);
    assert_eq!(session.last_error(), ErrorKind::AuthError);
    assert_eq!(session.last_error_message(), "authentication failure");
    assert_eq!(recorder.messages(), vec!["LOGIN REQUESTED", "LOGIN FAILED"]);
}

#[tokio::test]
async fn test_update_over_http() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/services/data/v29.0/sobjects/Account/001A"))
        .and(query_param("_HttpMethod", "PATCH"))
        .and(body_json(json!({"Name": "Acme Corp"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (session, recorder) = http_session(&server);
    session.login("user@example.com", "pw").unwrap().await;
    session
        .update("Account", &record(&[("Id", "001A"), ("Name", "Acme Corp")]))
        .unwrap()
        .await;

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.last_error(), ErrorKind::None);
    assert_eq!(recorder.messages().last().unwrap(), "CRUD SUCCESSFUL");
}

#[tokio::test]
async fn test_unreachable_api_is_call_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T",
            "instance_url": "http://127.0.0.1:9",
        })))
        .mount(&server)
        .await;

    let (session, recorder) = http_session(&server);
    session.login("user@example.com", "pw").unwrap().await;
    session.query_all("Account", &["Id"], true).unwrap().await;

    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.last_error(), ErrorKind::CallError);
    assert!(!session.last_error_message().is_empty());
    assert!(recorder.messages().last().unwrap().starts_with("QUERY ERROR"));
    assert!(!session.current_result().unwrap().is_completed());
}
