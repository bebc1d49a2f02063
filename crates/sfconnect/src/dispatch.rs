//! Authenticated data calls and response classification
//!
//! Builds the REST requests behind queries and CRUD operations and turns
//! whatever the transport returns into a success body or a [`CallFailure`].
//!
//! Classification looks at content, never at the status code:
//!
//! 1. transport error: [`FailureKind::Transport`] with the transport's text
//! 2. body contains the error marker: [`FailureKind::Rejected`] with the
//!    message pulled from the body
//! 3. anything else: success
//!
//! [`FailureKind::Transport`]: crate::error::FailureKind::Transport
//! [`FailureKind::Rejected`]: crate::error::FailureKind::Rejected

use crate::auth::AccessGrant;
use crate::error::CallFailure;
use crate::record_set::Record;
use serde_json::{Map, Value};
use sfconnect_transport::{HttpRequest, HttpResponse, Transport, TransportError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker whose presence in a data response body means failure.
pub const DATA_ERROR_MARKER: &str = "errorCode";

/// Field carrying the failure reason in a data error body.
pub const DATA_ERROR_MESSAGE_FIELD: &str = "message";

/// Which family of operation a dispatch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// SOQL query; the body fills a record set
    Query,
    /// Insert, update or delete; the body is only reported
    Crud,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Crud => f.write_str("crud"),
        }
    }
}

/// Classify a transport result by content.
///
/// `marker` is searched for literally anywhere in the body; when present the
/// failure message is the first string found under `message_field`.
pub fn classify(
    result: Result<HttpResponse, TransportError>,
    marker: &str,
    message_field: &str,
) -> Result<String, CallFailure> {
    let response = match result {
        Ok(response) => response,
        Err(err) => return Err(CallFailure::transport(&err)),
    };

    let body = response.text();
    if body.contains(marker) {
        return Err(CallFailure::rejected(extract_message(&body, message_field)));
    }

    Ok(body)
}

/// First string value stored under `field` anywhere in a JSON body.
///
/// Error bodies come both as objects and as arrays of objects, so the search
/// descends into both. A body that is not JSON is returned trimmed.
pub fn extract_message(body: &str, field: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => find_string(&value, field).unwrap_or_default(),
        Err(_) => body.trim().to_string(),
    }
}

fn find_string(value: &Value, field: &str) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(found)) = map.get(field) {
                return Some(found.clone());
            }
            map.values().find_map(|nested| find_string(nested, field))
        }
        Value::Array(items) => items.iter().find_map(|item| find_string(item, field)),
        _ => None,
    }
}

/// Request builders for the data endpoints of an authenticated org.
#[derive(Debug, Clone, Copy)]
pub struct DataApi<'a> {
    grant: &'a AccessGrant,
    version: &'a str,
}

impl<'a> DataApi<'a> {
    /// Builders bound to `grant` and an API version such as `v29.0`.
    pub fn new(grant: &'a AccessGrant, version: &'a str) -> Self {
        Self { grant, version }
    }

    fn base(&self) -> String {
        format!(
            "{}/services/data/{}",
            self.grant.instance_url().trim_end_matches('/'),
            self.version
        )
    }

    fn authorized(&self, method: &str, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .with_header("Authorization", format!("Bearer {}", self.grant.token()))
            .with_header("Content-Type", "application/json")
    }

    /// `GET .../query?q=<soql>`
    pub fn query(&self, soql: &str) -> HttpRequest {
        let encoded: String = url::form_urlencoded::byte_serialize(soql.as_bytes()).collect();
        self.authorized("GET", format!("{}/query?q={}", self.base(), encoded))
    }

    /// `POST .../sobjects/<type>` with the record's fields as JSON.
    pub fn insert(&self, object_type: &str, record: &Record) -> HttpRequest {
        self.authorized("POST", format!("{}/sobjects/{}", self.base(), object_type))
            .with_text_body(record_body(record))
    }

    /// `POST .../sobjects/<type>/<id>?_HttpMethod=PATCH`
    pub fn update(&self, object_type: &str, id: &str, record: &Record) -> HttpRequest {
        self.authorized(
            "POST",
            format!(
                "{}/sobjects/{}/{}?_HttpMethod=PATCH",
                self.base(),
                object_type,
                id
            ),
        )
        .with_text_body(record_body(record))
    }

    /// `POST .../sobjects/<type>/<id>?_HttpMethod=DELETE`
    pub fn delete(&self, object_type: &str, id: &str) -> HttpRequest {
        self.authorized(
            "POST",
            format!(
                "{}/sobjects/{}/{}?_HttpMethod=DELETE",
                self.base(),
                object_type,
                id
            ),
        )
    }
}

/// JSON object of the record's fields, without its id.
pub fn record_body(record: &Record) -> String {
    let fields: Map<String, Value> = record
        .iter()
        .filter(|(key, _)| !is_id_key(key))
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    Value::Object(fields).to_string()
}

/// Id of a record for update/delete: `id`, else `Id`, ignoring empty values.
pub fn record_id(record: &Record) -> Option<&str> {
    ["id", "Id"]
        .into_iter()
        .filter_map(|key| record.get(key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

fn is_id_key(key: &str) -> bool {
    key == "id" || key == "Id"
}

/// Sends authenticated data calls and classifies their outcome.
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
}

impl RequestDispatcher {
    /// Dispatcher over `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send `request` and classify the result.
    ///
    /// Query and CRUD calls share one classification; `kind` only labels logs.
    pub async fn dispatch(&self, request: HttpRequest, kind: CallKind) -> Result<String, CallFailure> {
        debug!(%kind, method = %request.method, "Dispatching data call");

        let outcome = classify(
            self.transport.send_http(request).await,
            DATA_ERROR_MARKER,
            DATA_ERROR_MESSAGE_FIELD,
        );

        match &outcome {
            Ok(body) => debug!(%kind, body_size = body.len(), "Data call succeeded"),
            Err(failure) => warn!(%kind, kind_of_failure = ?failure.kind, message = %failure.message, "Data call failed"),
        }

        outcome
    }
}

impl fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn grant() -> AccessGrant {
        AccessGrant::new("T", "https://na1.example.com/")
    }

    #[test]
    fn test_classify_success() {
        let result = classify(
            Ok(HttpResponse::ok(r#"{"records": []}"#)),
            DATA_ERROR_MARKER,
            DATA_ERROR_MESSAGE_FIELD,
        );
        assert_eq!(result.unwrap(), r#"{"records": []}"#);
    }

    #[test]
    fn test_classify_rejection_ignores_status() {
        let body = r#"[{"message": "No such column 'Foo'", "errorCode": "INVALID_FIELD"}]"#;
        let mut response = HttpResponse::ok(body);
        response.status = 200;

        let failure = classify(Ok(response), DATA_ERROR_MARKER, DATA_ERROR_MESSAGE_FIELD)
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Rejected);
        assert_eq!(failure.message, "No such column 'Foo'");
    }

    #[test]
    fn test_classify_error_status_without_marker_is_success() {
        let mut response = HttpResponse::ok("");
        response.status = 500;
        assert_eq!(
            classify(Ok(response), DATA_ERROR_MARKER, DATA_ERROR_MESSAGE_FIELD).unwrap(),
            ""
        );
    }

    #[test]
    fn test_classify_transport_failure() {
        let failure = classify(
            Err(TransportError::Timeout),
            DATA_ERROR_MARKER,
            DATA_ERROR_MESSAGE_FIELD,
        )
        .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.message, "Timeout");
    }

    #[test]
    fn test_extract_message_variants() {
        assert_eq!(
            extract_message(r#"{"error": "invalid_grant", "error_description": "authentication failure"}"#, "error_description"),
            "authentication failure"
        );
        assert_eq!(extract_message(r#"{"errorCode": "X"}"#, "message"), "");
        assert_eq!(extract_message("  upstream errorCode 502 ", "message"), "upstream errorCode 502");
    }

    #[test]
    fn test_query_request() {
        let grant = grant();
        let request = DataApi::new(&grant, "v29.0").query("SELECT Id FROM Account");

        assert_eq!(request.method, "GET");
        assert_eq!(
            request.url,
            "https://na1.example.com/services/data/v29.0/query?q=SELECT+Id+FROM+Account"
        );
        assert_eq!(request.get_header("Authorization"), Some("Bearer T"));
        assert_eq!(request.get_header("Content-Type"), Some("application/json"));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_crud_requests() {
        let grant = grant();
        let api = DataApi::new(&grant, "v29.0");
        let record: Record = [("id", "001A"), ("Name", "Acme")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let insert = api.insert("Account", &record);
        assert_eq!(insert.method, "POST");
        assert_eq!(
            insert.url,
            "https://na1.example.com/services/data/v29.0/sobjects/Account"
        );
        assert_eq!(insert.body_text().unwrap(), r#"{"Name":"Acme"}"#);

        let update = api.update("Account", "001A", &record);
        assert_eq!(
            update.url,
            "https://na1.example.com/services/data/v29.0/sobjects/Account/001A?_HttpMethod=PATCH"
        );
        assert_eq!(update.body_text().unwrap(), r#"{"Name":"Acme"}"#);

        let delete = api.delete("Account", "001A");
        assert_eq!(delete.method, "POST");
        assert!(delete.url.ends_with("/sobjects/Account/001A?_HttpMethod=DELETE"));
        assert_eq!(delete.get_header("Authorization"), Some("Bearer T"));
    }

    #[test]
    fn test_record_id() {
        let mut record = Record::new();
        assert_eq!(record_id(&record), None);

        record.insert("Id".into(), "001B".into());
        assert_eq!(record_id(&record), Some("001B"));

        record.insert("id".into(), " ".into());
        assert_eq!(record_id(&record), Some("001B"));

        record.insert("id".into(), "001A".into());
        assert_eq!(record_id(&record), Some("001A"));
    }
}
