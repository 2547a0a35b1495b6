//! Verify request building and response classification against the JSON
//! vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs and the exact expected output. URLs and
//! headers are compared byte for byte; the wire format is part of the
//! contract.

use serde_json::Value;
use vergeio_core::{Client, Credential, HttpMethod, HttpResponse, QueryOptions};

const HOST: &str = "https://verge.local";

fn client() -> Client {
    Client::new(Credential::new(HOST, "admin", "secret").unwrap())
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn opt_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn parse_query(value: &Value) -> QueryOptions {
    QueryOptions {
        limit: opt_string(&value["limit"]),
        offset: opt_string(&value["offset"]),
        sort: opt_string(&value["sort"]),
        fields: opt_string(&value["fields"]),
        filter: opt_string(&value["filter"]),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let query = parse_query(&case["query"]);
        let expected = &case["expected"];

        let req = c
            .build_request(
                method,
                case["endpoint"].as_str().unwrap(),
                case["body"].as_str(),
                Some(&query),
            )
            .unwrap();

        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let pair = h.as_array().unwrap();
                (
                    pair[0].as_str().unwrap().to_string(),
                    pair[1].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
        assert_eq!(
            req.body.as_deref(),
            expected["body"].as_str(),
            "{name}: body"
        );
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected"];
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };

        let result = c.classify("api/v4/vms", response.clone());
        if expected["ok"].as_bool().unwrap() {
            assert_eq!(result.unwrap(), response, "{name}: passthrough");
            continue;
        }

        let err = result.unwrap_err();
        let api = err.api().unwrap_or_else(|| panic!("{name}: not an API error"));
        assert_eq!(api.status, response.status, "{name}: status");
        assert_eq!(api.endpoint, "api/v4/vms", "{name}: endpoint");
        assert_eq!(api.message, expected["message"].as_str().unwrap(), "{name}: message");
        assert_eq!(err.to_string(), expected["display"].as_str().unwrap(), "{name}: display");
    }
}
