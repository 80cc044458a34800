use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command};
use std::time::Duration;

use http_monitor::{
    CONTENT_TYPE, EXPOSITION_PATH, MetricsError, MetricsRegistry, SERVER_REQUEST_DURATION,
    SERVER_REQUESTS_TOTAL,
};

/// Issue a GET over a fresh connection. Returns (head, body).
fn http_get(addr: SocketAddr, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    stream.flush().unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((&raw, ""));
    (head.to_string(), body.to_string())
}

/// Blocking scrape run off the async runtime.
async fn scrape(addr: SocketAddr, path: &'static str) -> (String, String) {
    tokio::task::spawn_blocking(move || http_get(addr, path))
        .await
        .unwrap()
}

fn loopback(addr: SocketAddr) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, addr.port()))
}

fn find_line<'a>(body: &'a str, prefix: &str, labels: &[&str]) -> Option<&'a str> {
    body.lines()
        .filter(|line| line.starts_with(prefix))
        .find(|line| labels.iter().all(|label| line.contains(label)))
}

fn value(line: &str) -> f64 {
    line.rsplit(' ').next().unwrap().parse().unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_start_serves_server_counter() {
    let (registry, exposition) = MetricsRegistry::start("svc", 0).await.unwrap();
    registry.http_server_counter("/x");

    let (head, body) = scrape(loopback(exposition.local_addr()), EXPOSITION_PATH).await;
    assert!(head.starts_with("HTTP/1.1 200"), "{head}");
    assert!(
        head.to_ascii_lowercase()
            .contains(&format!("content-type: {CONTENT_TYPE}")),
        "{head}"
    );

    let line = find_line(
        &body,
        &format!("{SERVER_REQUESTS_TOTAL}{{"),
        &["path=\"/x\"", "app_name=\"svc\""],
    )
    .unwrap_or_else(|| panic!("missing counter in:\n{body}"));
    assert_eq!(value(line), 1.0);

    exposition.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duration_scrape_shows_one_observation() {
    let (registry, exposition) = MetricsRegistry::start("svc", 0).await.unwrap();
    registry.http_server_duration("/x", "200", Duration::from_millis(150));

    let (_, body) = scrape(loopback(exposition.local_addr()), EXPOSITION_PATH).await;

    let count = find_line(
        &body,
        &format!("{SERVER_REQUEST_DURATION}_count{{"),
        &["path=\"/x\"", "status=\"200\""],
    )
    .unwrap_or_else(|| panic!("missing histogram in:\n{body}"));
    assert_eq!(value(count), 1.0);

    exposition.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dynamic_counter_is_scraped() {
    let registry = MetricsRegistry::new("svc").unwrap();
    let exposition = registry
        .listen_and_serve(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .unwrap();

    let labels: HashMap<String, String> = [("kind", "signup"), ("source", "web")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    registry.inc_counter("app_events", &labels).unwrap();
    registry.inc_counter("app_events", &labels).unwrap();

    let (_, body) = scrape(exposition.local_addr(), EXPOSITION_PATH).await;
    assert!(
        body.contains("app_events{kind=\"signup\",source=\"web\"} 2"),
        "{body}"
    );

    exposition.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_path_is_not_found() {
    let (_registry, exposition) = MetricsRegistry::start("svc", 0).await.unwrap();

    let (head, _) = scrape(loopback(exposition.local_addr()), "/metrics").await;
    assert!(head.starts_with("HTTP/1.1 404"), "{head}");

    exposition.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abort_stops_exposition_task() {
    let (_registry, exposition) = MetricsRegistry::start("svc", 0).await.unwrap();
    assert!(!exposition.is_finished());

    exposition.abort();
    for _ in 0..50 {
        if exposition.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(exposition.is_finished());
}

#[tokio::test]
async fn test_bind_failure_is_returned() {
    let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let addr = taken.local_addr().unwrap();

    let registry = MetricsRegistry::new("svc").unwrap();
    let err = registry.listen_and_serve(addr).await.unwrap_err();

    match err {
        MetricsError::Bind { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("unexpected error: {other}"),
    }
}

/// Spawn the monitor binary on a given port. Returns the child process handle.
fn spawn_monitor(port: u16) -> Child {
    let child = Command::new(env!("CARGO_BIN_EXE_http-monitor"))
        .args(["--app-name", "bin-test", "--port", &port.to_string()])
        .spawn()
        .expect("failed to start http-monitor");

    // Give the endpoint a moment to bind.
    std::thread::sleep(Duration::from_millis(500));
    child
}

#[test]
fn test_binary_serves_exposition_path() {
    let port = 19107;
    let mut monitor = spawn_monitor(port);

    let (head, _) = http_get(SocketAddr::from((Ipv4Addr::LOCALHOST, port)), EXPOSITION_PATH);
    assert!(head.starts_with("HTTP/1.1 200"), "{head}");

    monitor.kill().ok();
}
