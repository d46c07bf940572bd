//! `HttpTransport` against a canned local HTTP server.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use energydash::endpoints::Endpoint;
use energydash::models::Source;
use energydash::notify::RecordingNotifier;
use energydash::state::Config;
use energydash::transport::{HttpTransport, Transport};
use energydash::{Dashboard, TransportError};

/// Serves `responses` in order, one per connection, and returns the base URL.
async fn serve(responses: Vec<(u16, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut sock, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = sock.write_all(reply.as_bytes()).await;
            let _ = sock.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

fn config(base: String) -> Config {
    Config {
        api_base: base,
        request_timeout_ms: Some(2_000),
        ..Config::default()
    }
}

#[tokio::test]
async fn parses_json_body() {
    let base = serve(vec![(200, r#"{"countries":["Almanya"]}"#)]).await;
    let t = HttpTransport::new(&config(base)).unwrap();
    let v = t.get_json(&Endpoint::expand("/api/countries", &[])).await.unwrap();
    assert_eq!(v["countries"][0], "Almanya");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let base = serve(vec![(500, "{}")]).await;
    let t = HttpTransport::new(&config(base)).unwrap();
    let err = t.get_json(&Endpoint::expand("/api/countries", &[])).await.unwrap_err();
    assert_eq!(err, TransportError::Status(500));
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let base = serve(vec![(200, "<html>")]).await;
    let t = HttpTransport::new(&config(base)).unwrap();
    let err = t.get_json(&Endpoint::expand("/api/countries", &[])).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)), "{:?}", err);
}

#[tokio::test]
async fn dashboard_falls_through_to_working_endpoint() {
    let base = serve(vec![(404, "{}"), (200, r#"[{"code":"tr","name":"Türkiye"}]"#)]).await;
    let cfg = config(base);
    let transport = Arc::new(HttpTransport::new(&cfg).unwrap());
    let notes = Arc::new(RecordingNotifier::new());
    let d = Dashboard::new(cfg, transport, notes.clone());

    let r = d.countries().await;
    assert_eq!(r.source, Source::Api);
    assert_eq!(r.endpoint_used.as_deref(), Some("/api/data/countries"));
    assert_eq!(r.records[0].code, "tr");
    assert_eq!(notes.count(), 0);
}
