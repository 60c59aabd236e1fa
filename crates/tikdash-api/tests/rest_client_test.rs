// Integration tests for `RestClient` using wiremock.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tikdash_api::models::{self, HotspotUserRow, IdentityRow};
use tikdash_api::{ConnectParams, Error, ResourcePath, RestClient, RouterRpc};

// ── Helpers ─────────────────────────────────────────────────────────

fn params_for(server: &MockServer) -> ConnectParams {
    let mut params = ConnectParams::new(
        "127.0.0.1",
        "admin",
        SecretString::from("changeme".to_string()),
    );
    params.port = server.address().port();
    params.timeout = Duration::from_secs(2);
    params
}

async fn mount_identity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/system/identity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "gateway-01" })))
        .mount(server)
        .await;
}

async fn connected_client(server: &MockServer) -> RestClient {
    mount_identity(server).await;
    RestClient::connect(&params_for(server))
        .await
        .expect("connect should succeed against mock router")
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_probes_identity() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    let row = client.get(ResourcePath::SystemIdentity).await.unwrap();
    let identity: IdentityRow = models::from_row(row).unwrap();
    assert_eq!(identity.name, "gateway-01");
}

#[tokio::test]
async fn connect_rejected_credentials_classify_as_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/system/identity"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = RestClient::connect(&params_for(&server)).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));
}

#[tokio::test]
async fn connect_timeout_message_names_the_port() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/system/identity"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "slow" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut params = params_for(&server);
    params.timeout = Duration::from_millis(100);

    let err = RestClient::connect(&params).await.unwrap_err();
    match err {
        Error::Timeout { port, .. } => {
            assert_eq!(port, server.address().port());
        }
        other => panic!("expected Timeout, got {other:?}"),
    }

    // Operators read the message to find the misconfigured service.
    let err = RestClient::connect(&params).await.unwrap_err();
    assert!(err.to_string().contains(&server.address().port().to_string()));
}

#[tokio::test]
async fn connect_refused_classifies_as_connection_refused() {
    // Bind-then-drop to find a port nothing is listening on.
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let mut params = ConnectParams::new(
        "127.0.0.1",
        "admin",
        SecretString::from("changeme".to_string()),
    );
    params.port = port;
    params.timeout = Duration::from_secs(2);

    let err = RestClient::connect(&params).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionRefused { .. }), "got {err:?}");
    assert!(err.is_connection_lost());
}

// ── Verbs ───────────────────────────────────────────────────────────

#[tokio::test]
async fn list_returns_typed_rows() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/ip/hotspot/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                ".id": "*1",
                "name": "guest-01",
                "password": "pw1",
                "profile": "default",
                "bytes-in": "2048",
                "bytes-out": "4096",
                "disabled": "false",
            },
            { ".id": "*2", "name": "guest-02" },
        ])))
        .mount(&server)
        .await;

    let rows = client.list(ResourcePath::HotspotUser).await.unwrap();
    let users: Vec<HotspotUserRow> = models::from_rows(rows).unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, "*1");
    assert_eq!(users[0].bytes_out.as_deref(), Some("4096"));
    assert_eq!(users[1].name, "guest-02");
    assert!(users[1].password.is_none());
}

#[tokio::test]
async fn add_puts_the_record() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    let expected = json!({ "name": "guest-03", "password": "pw3", "profile": "1h" });
    Mock::given(method("PUT"))
        .and(path("/rest/ip/hotspot/user"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ ".id": "*9" })))
        .expect(1)
        .mount(&server)
        .await;

    let row = match expected {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    client.add(ResourcePath::HotspotUser, row).await.unwrap();
}

#[tokio::test]
async fn remove_addresses_the_record_id() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/ip/hotspot/active/*7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.remove(ResourcePath::HotspotActive, "*7").await.unwrap();
}

#[tokio::test]
async fn command_failure_surfaces_the_detail() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    Mock::given(method("PUT"))
        .and(path("/rest/ip/hotspot/user"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": 400,
            "message": "Bad Request",
            "detail": "failure: already have user with this name",
        })))
        .mount(&server)
        .await;

    let err = client
        .add(ResourcePath::HotspotUser, tikdash_api::Row::new())
        .await
        .unwrap_err();

    match err {
        Error::Command { message, status } => {
            assert_eq!(status, Some(400));
            assert!(message.contains("already have user"));
        }
        other => panic!("expected Command, got {other:?}"),
    }
}

// ── Close ───────────────────────────────────────────────────────────

#[tokio::test]
async fn close_is_idempotent_and_bars_dispatch() {
    let server = MockServer::start().await;
    let client = connected_client(&server).await;

    client.close().await.unwrap();
    client.close().await.unwrap();

    let err = client.list(ResourcePath::HotspotUser).await.unwrap_err();
    assert!(matches!(err, Error::Closed));
    assert!(err.is_connection_lost());
}
