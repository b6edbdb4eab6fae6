use std::time::Duration;

use praise_core::SyncOutcome;
use praise_engine::{ReqwestSyncClient, SyncClient, SyncSettings};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestSyncClient {
    let settings = SyncSettings {
        request_timeout: Duration::from_secs(2),
        ..SyncSettings::new(format!("{}/tools/praise", server.uri()), "s3cret")
    };
    ReqwestSyncClient::new(settings).expect("client")
}

#[tokio::test]
async fn submit_sends_record_as_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tools/praise/add_record"))
        .and(query_param("s", "s3cret"))
        .and(query_param("t", "10/1/2026 9:00 AM"))
        .and(query_param("r", "Sam Diaz"))
        .and(query_param("d", "Amy Lee"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .submit("10/1/2026 9:00 AM", "Sam Diaz", "Amy Lee")
        .await;
    assert_eq!(outcome, SyncOutcome::Created);
}

#[tokio::test]
async fn submit_classifies_duplicates_and_failures() {
    let server = MockServer::start().await;
    for (praised, template) in [
        ("dup", ResponseTemplate::new(200).set_body_string("2")),
        ("down", ResponseTemplate::new(503).set_body_string("maintenance")),
        ("odd", ResponseTemplate::new(200).set_body_string("unexpected")),
    ] {
        Mock::given(method("GET"))
            .and(path("/tools/praise/add_record"))
            .and(query_param("d", praised))
            .respond_with(template)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    assert_eq!(client.submit("t", "r", "dup").await, SyncOutcome::Duplicate);
    assert_eq!(client.submit("t", "r", "down").await, SyncOutcome::TransportError);
    assert_eq!(client.submit("t", "r", "odd").await, SyncOutcome::ServerError);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    assert_eq!(
        client.submit("t", "r", "d").await,
        SyncOutcome::TransportError
    );
    assert!(!client.touch_last_sync().await);
}

#[tokio::test]
async fn touch_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tools/praise/touch_last_sync"))
        .and(query_param("s", "s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tools/praise/touch_last_sync"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.touch_last_sync().await);
    assert!(!client.touch_last_sync().await);
}
