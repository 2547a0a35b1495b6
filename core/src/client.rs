//! Authenticated transport client for the VergeOS API.
//!
//! # Design
//! `Client` owns the credential and an `HttpTransport`. Each call is split
//! into `build_request` (pure: URL, Basic auth, query string, content type),
//! the transport round-trip, and `classify` (pure: status to success body or
//! `ApiError`). The client keeps no state between calls and never retries,
//! so one instance can be shared across threads.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Credential;
use crate::error::{ApiError, Error, Result, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, UreqTransport};
use crate::observer::{Event, Observer, TracingObserver};
use crate::query::QueryOptions;
use crate::types::ResponseEnvelope;

/// Synchronous client for the VergeOS API.
pub struct Client<T: HttpTransport = UreqTransport> {
    credential: Credential,
    transport: T,
    observer: Arc<dyn Observer>,
}

impl Client<UreqTransport> {
    /// Client over the blocking ureq transport, logging through `tracing`.
    pub fn new(credential: Credential) -> Self {
        let transport = UreqTransport::new(&credential);
        Self::with_transport(credential, transport)
    }
}

impl<T: HttpTransport> Client<T> {
    pub fn with_transport(credential: Credential, transport: T) -> Self {
        Self {
            credential,
            transport,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the observer that receives request/response events.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request for `endpoint` without sending it.
    ///
    /// Query options apply to GET only; a body applies to POST and PUT only.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&str>,
        query: Option<&QueryOptions>,
    ) -> Result<HttpRequest> {
        let endpoint = endpoint.trim_start_matches('/');
        let mut url = format!("{}/{}", self.credential.host(), endpoint);
        if method == HttpMethod::Get {
            let encoded = query.cloned().unwrap_or_default().encode_for_read();
            url.push('?');
            url.push_str(&encoded);
        }
        Url::parse(&url).map_err(|e| TransportError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let mut headers = vec![("Authorization".to_string(), self.basic_auth())];
        let body = match method {
            HttpMethod::Post | HttpMethod::Put => body.filter(|b| !b.is_empty()),
            HttpMethod::Get | HttpMethod::Delete => None,
        };
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        Ok(HttpRequest {
            method,
            endpoint: endpoint.to_string(),
            url,
            headers,
            body: body.map(str::to_string),
        })
    }

    fn basic_auth(&self) -> String {
        let pair = format!("{}:{}", self.credential.username(), self.credential.password());
        format!("Basic {}", STANDARD.encode(pair))
    }

    /// Pass 2xx/3xx responses through; turn anything else into an `ApiError`.
    ///
    /// The error message is the envelope's `err` when the body decodes as an
    /// envelope with a non-empty error, otherwise the raw body.
    pub fn classify(&self, endpoint: &str, response: HttpResponse) -> Result<HttpResponse> {
        if (200..400).contains(&response.status) {
            return Ok(response);
        }
        let message = serde_json::from_str::<ResponseEnvelope>(&response.body)
            .ok()
            .and_then(|env| env.error_message().map(str::to_string))
            .unwrap_or(response.body);
        Err(ApiError {
            message,
            status: response.status,
            endpoint: endpoint.trim_start_matches('/').to_string(),
        }
        .into())
    }

    /// Build, send, and classify one request.
    pub fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&str>,
        query: Option<&QueryOptions>,
    ) -> Result<HttpResponse> {
        let result = self.round_trip(method, endpoint, body, query);
        if let Err(err) = &result {
            self.observer.observe(&Event::ErrorProduced {
                endpoint: endpoint.trim_start_matches('/').to_string(),
                error: err.to_string(),
            });
        }
        result
    }

    fn round_trip(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&str>,
        query: Option<&QueryOptions>,
    ) -> Result<HttpResponse> {
        let request = self.build_request(method, endpoint, body, query)?;
        let endpoint = request.endpoint.clone();
        self.observer.observe(&Event::RequestIssued {
            method,
            endpoint: endpoint.clone(),
            url: request.url.clone(),
            has_body: request.body.is_some(),
        });

        let response = self.transport.send(request)?;
        self.observer.observe(&Event::ResponseClassified {
            method,
            endpoint: endpoint.clone(),
            status: response.status,
        });
        self.classify(&endpoint, response)
    }

    pub fn get(&self, endpoint: &str, query: Option<&QueryOptions>) -> Result<HttpResponse> {
        self.execute(HttpMethod::Get, endpoint, None, query)
    }

    pub fn post(&self, endpoint: &str, body: &str) -> Result<HttpResponse> {
        self.execute(HttpMethod::Post, endpoint, Some(body), None)
    }

    pub fn put(&self, endpoint: &str, body: &str) -> Result<HttpResponse> {
        self.execute(HttpMethod::Put, endpoint, Some(body), None)
    }

    pub fn delete(&self, endpoint: &str) -> Result<HttpResponse> {
        self.execute(HttpMethod::Delete, endpoint, None, None)
    }

    /// GET `endpoint` and decode the body as `D`.
    pub fn get_json<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&QueryOptions>,
    ) -> Result<D> {
        let response = self.get(endpoint, query)?;
        decode(endpoint, &response)
    }
}

/// Decode a success body, reporting failures as `Error::Decode`.
pub(crate) fn decode<D: DeserializeOwned>(endpoint: &str, response: &HttpResponse) -> Result<D> {
    serde_json::from_str(&response.body).map_err(|e| Error::Decode {
        endpoint: endpoint.trim_start_matches('/').to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::observer::RecordingObserver;
    use crate::testing::{response, ScriptedTransport};

    fn credential() -> Credential {
        Credential::new("https://verge.local", "admin", "secret").unwrap()
    }

    fn client() -> Client<ScriptedTransport> {
        Client::with_transport(credential(), ScriptedTransport::new())
    }

    #[test]
    fn get_defaults_fields_to_most() {
        let req = client()
            .build_request(HttpMethod::Get, "api/v4/vms", None, None)
            .unwrap();
        assert_eq!(req.url, "https://verge.local/api/v4/vms?fields=most");
        assert_eq!(req.endpoint, "api/v4/vms");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn get_encodes_query_options() {
        let query = QueryOptions::new().filter("name eq 'web'").limit(1);
        let req = client()
            .build_request(HttpMethod::Get, "api/v4/vms", None, Some(&query))
            .unwrap();
        assert_eq!(
            req.url,
            "https://verge.local/api/v4/vms?fields=most&filter=name+eq+%27web%27&limit=1"
        );
    }

    #[test]
    fn every_request_carries_basic_auth() {
        let c = client();
        for method in [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete] {
            let req = c.build_request(method, "api/v4/vms/1", Some("{}"), None).unwrap();
            // base64("admin:secret")
            assert_eq!(req.header("authorization"), Some("Basic YWRtaW46c2VjcmV0"));
            assert!(!req.url.contains("secret"));
        }
    }

    #[test]
    fn writes_ignore_query_options_and_set_json_content_type() {
        let query = QueryOptions::new().filter("name eq 'x'");
        let req = client()
            .build_request(HttpMethod::Post, "api/v4/vms", Some(r#"{"name":"x"}"#), Some(&query))
            .unwrap();
        assert_eq!(req.url, "https://verge.local/api/v4/vms");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"name":"x"}"#));
    }

    #[test]
    fn empty_write_body_sets_no_content_type() {
        let req = client()
            .build_request(HttpMethod::Put, "api/v4/vms/1", Some(""), None)
            .unwrap();
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn delete_has_no_body_and_no_query() {
        let query = QueryOptions::new().limit(3);
        let req = client()
            .build_request(HttpMethod::Delete, "api/v4/vms/1", Some("{}"), Some(&query))
            .unwrap();
        assert_eq!(req.url, "https://verge.local/api/v4/vms/1");
        assert!(req.body.is_none());
    }

    #[test]
    fn leading_slash_on_endpoint_is_ignored() {
        let req = client()
            .build_request(HttpMethod::Delete, "/api/v4/vms/1", None, None)
            .unwrap();
        assert_eq!(req.url, "https://verge.local/api/v4/vms/1");
    }

    #[test]
    fn classify_decodes_envelope_error() {
        let err = client()
            .classify("api/v4/vms", response(409, r#"{"err":"name already exists"}"#))
            .unwrap_err();
        let api = err.api().unwrap();
        assert_eq!(api.message, "name already exists");
        assert_eq!(api.status, 409);
        assert_eq!(api.endpoint, "api/v4/vms");
    }

    #[test]
    fn classify_falls_back_to_raw_body() {
        let err = client()
            .classify("api/v4/vms", response(500, "not json"))
            .unwrap_err();
        assert_eq!(err.api().unwrap().message, "not json");
    }

    #[test]
    fn classify_uses_raw_body_when_envelope_has_no_error() {
        let err = client()
            .classify("api/v4/vms", response(400, r#"{"$key": 3}"#))
            .unwrap_err();
        assert_eq!(err.api().unwrap().message, r#"{"$key": 3}"#);
    }

    #[test]
    fn classify_passes_success_through() {
        let ok = client().classify("version.json", response(200, "{}")).unwrap();
        assert_eq!(ok.body, "{}");
    }

    #[test]
    fn execute_reports_events_in_order() {
        let observer = Arc::new(RecordingObserver::new());
        let transport = ScriptedTransport::new().reply(404, r#"{"err":"not found"}"#);
        let client = Client::with_transport(credential(), transport).with_observer(observer.clone());

        let err = client.get("api/v4/vms/9", None).unwrap_err();
        assert!(err.api().unwrap().is_not_found());

        let events = observer.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Event::RequestIssued { method: HttpMethod::Get, .. }));
        assert!(matches!(&events[1], Event::ResponseClassified { status: 404, .. }));
        assert!(
            matches!(&events[2], Event::ErrorProduced { endpoint, .. } if endpoint == "api/v4/vms/9")
        );
    }

    #[test]
    fn transport_failures_surface_immediately() {
        let transport = ScriptedTransport::new().fail("connection refused");
        let client = Client::with_transport(credential(), transport);
        let err = client.delete("api/v4/vms/1").unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Send { .. })));
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn get_json_reports_decode_errors_distinctly() {
        let transport = ScriptedTransport::new().reply(200, "not json");
        let client = Client::with_transport(credential(), transport);
        let err = client
            .get_json::<serde_json::Value>("version.json", None)
            .unwrap_err();
        assert!(matches!(err, Error::Decode { ref endpoint, .. } if endpoint == "version.json"));
    }
}
