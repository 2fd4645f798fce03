//! HTTP transport integration tests against a local wiremock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oxidoo_protocol::{Endpoint, FaultKind};
use oxidoo_transport::{HttpTransport, HttpTransportConfig, Transport, TransportError};

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(HttpTransportConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .expect("transport should build against a valid mock uri")
}

#[tokio::test]
async fn call_round_trips_the_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": "common",
                "method": "version",
                "args": [],
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"server_version": "17.0"},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let result = transport
        .call(Endpoint::Common, "version", vec![])
        .await
        .expect("version call should succeed");

    assert_eq!(result, json!({"server_version": "17.0"}));
}

#[tokio::test]
async fn positional_args_are_preserved_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_partial_json(json!({
            "params": {
                "service": "object",
                "method": "execute",
                "args": ["prod", 2, "secret", "res.partner", "search", [["active", "=", true]], 0, 10, "name ASC", {}],
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": [1, 2, 3],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let args = vec![
        json!("prod"),
        json!(2),
        json!("secret"),
        json!("res.partner"),
        json!("search"),
        json!([["active", "=", true]]),
        json!(0),
        json!(10),
        json!("name ASC"),
        json!({}),
    ];
    let result = transport
        .call(Endpoint::Object, "execute", args)
        .await
        .expect("search call should succeed");

    assert_eq!(result, json!([1, 2, 3]));
}

#[tokio::test]
async fn remote_fault_payload_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 200, "message": "Access Denied", "data": {"name": "AccessDenied"}},
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport
        .call(Endpoint::Object, "execute", vec![])
        .await
        .expect_err("fault payload should surface as an error");

    let TransportError::Remote(fault) = err else {
        panic!("expected a remote fault, got {err:?}");
    };
    assert_eq!(fault.kind, FaultKind::Application);
    assert_eq!(fault.code, Some(200));
    assert!(!fault.is_transient());
}

#[tokio::test]
async fn transient_marked_fault_is_retriable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 200, "message": "serialization failure, retry", "data": {"transient": true}},
        })))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.call(Endpoint::Object, "execute", vec![]).await.unwrap_err();

    let TransportError::Remote(fault) = err else {
        panic!("expected a remote fault, got {err:?}");
    };
    assert_eq!(fault.kind, FaultKind::Server);
    assert!(fault.is_transient());
}

#[tokio::test]
async fn server_error_status_maps_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.call(Endpoint::Common, "version", vec![]).await.unwrap_err();

    assert!(matches!(err, TransportError::Unavailable(_)));
    let fault = oxidoo_protocol::Fault::from(err);
    assert!(fault.is_transient());
}

#[tokio::test]
async fn client_error_status_is_a_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let err = transport.call(Endpoint::Common, "version", vec![]).await.unwrap_err();

    assert!(matches!(err, TransportError::ProtocolError(_)));
}

#[tokio::test]
async fn request_ids_increment_per_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_partial_json(json!({"id": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1, "result": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_partial_json(json!({"id": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 2, "result": true,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    transport.call(Endpoint::Common, "version", vec![]).await.unwrap();
    transport.call(Endpoint::Common, "version", vec![]).await.unwrap();
}
