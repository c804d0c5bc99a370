//! End-to-end behaviour over real listeners.

mod common;

use std::io::Read;

use std::time::Duration;

use filegate::config::{ErrorPageConfig, OverridePolicy, Protocol, RedirectConfig, ServeConfig};
use filegate::{HttpServer, Shutdown};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use common::{base_config, client, self_signed, serve, site, spawn};

#[tokio::test]
async fn unmatched_error_statuses_get_reason_phrase() {
    let mut config = base_config();
    for code in 400..=599u16 {
        config.serves.push(ServeConfig {
            path: format!("/e/{code}/"),
            error: Some(code),
            ..ServeConfig::default()
        });
    }
    let server = spawn(config).await;
    let client = client();

    for code in 400..=599u16 {
        let response = client.get(server.url(&format!("/e/{code}/x"))).send().await.unwrap();
        let status = response.status();
        assert_eq!(status.as_u16(), code);
        assert_eq!(response.headers()["content-type"], "text/plain");
        let expected = status.canonical_reason().unwrap_or("");
        assert_eq!(response.text().await.unwrap(), expected, "status {code}");
    }
}

#[tokio::test]
async fn override_replaces_original_body() {
    let dir = site();
    let pages = tempfile::tempdir().unwrap();
    let not_found = pages.path().join("404.html");
    std::fs::write(&not_found, "<p>nothing to see</p>").unwrap();

    let mut config = base_config();
    config.serves.push(serve("/", dir.path()));
    config.errors.push(ErrorPageConfig {
        status: 404,
        target: not_found,
    });
    let server = spawn(config).await;

    let response = client().get(server.url("/missing.txt")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    let body = response.text().await.unwrap();
    assert_eq!(body, "<p>nothing to see</p>");
    assert!(!body.contains("Not Found"));
}

#[tokio::test]
async fn override_policies_disagree_on_status() {
    let dir = site();
    let mut observed = Vec::new();
    for policy in [OverridePolicy::PreserveStatus, OverridePolicy::HandlerStatus] {
        let mut config = base_config();
        config.override_status = policy;
        config.serves.push(serve("/", dir.path()));
        config.errors.push(ErrorPageConfig {
            status: 404,
            target: dir.path().join("page.html"),
        });
        let server = spawn(config).await;

        let response = client().get(server.url("/missing.txt")).send().await.unwrap();
        let status = response.status();
        assert_eq!(response.text().await.unwrap(), "<html><body>page</body></html>");
        observed.push(status);
    }

    assert_eq!(observed, [StatusCode::NOT_FOUND, StatusCode::OK]);
}

#[tokio::test]
async fn handler_policy_keeps_fallback_status_for_unreadable_page() {
    let dir = site();
    let mut config = base_config();
    config.override_status = OverridePolicy::HandlerStatus;
    config.serves.push(serve("/", dir.path()));
    config.errors.push(ErrorPageConfig {
        status: 404,
        target: dir.path().join("no-such-page.html"),
    });
    let server = spawn(config).await;

    let response = client().get(server.url("/missing.txt")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "Not Found");
}

#[tokio::test]
async fn injected_headers_never_override() {
    let dir = site();
    let mut config = base_config();
    config.listeners[0]
        .headers
        .insert("Content-Type".into(), "application/x-injected".into());
    config.listeners[0].headers.insert("X-Scope".into(), "listener".into());
    config.listeners[0].headers.insert("X-Listener".into(), "yes".into());

    let mut files = serve("/", dir.path());
    files.headers.insert("X-Scope".into(), "serve".into());
    config.serves.push(files);
    let server = spawn(config).await;

    let response = client().get(server.url("/hello.txt")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(response.headers()["x-scope"], "serve");
    assert_eq!(response.headers()["x-listener"], "yes");
}

#[tokio::test]
async fn listing_guard() {
    let dir = site();
    let mut config = base_config();
    config.serves.push(serve("/open/", dir.path()));
    let mut closed = serve("/closed/", dir.path());
    closed.prevent_listing = true;
    config.serves.push(closed);
    let server = spawn(config).await;
    let client = client();

    let response = client.get(server.url("/open/files/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = response.text().await.unwrap();
    assert!(listing.contains("<a href=\"one.txt\">one.txt</a>"));
    assert!(listing.contains("<a href=\"two.txt\">two.txt</a>"));

    let response = client.get(server.url("/closed/files/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response.text().await.unwrap();
    assert_eq!(body, "Forbidden");

    let response = client.get(server.url("/closed/docs/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<h1>docs</h1>");

    let response = client.get(server.url("/closed/files/one.txt")).send().await.unwrap();
    assert_eq!(response.text().await.unwrap(), "1");
}

#[tokio::test]
async fn gzip_compression() {
    let dir = site();
    let original = std::fs::read(dir.path().join("hello.txt")).unwrap();
    let mut config = base_config();
    config.listeners[0].gzip = true;
    config.serves.push(serve("/", dir.path()));
    let server = spawn(config).await;
    let client = client();

    let response = client
        .get(server.url("/hello.txt"))
        .header("accept-encoding", "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["content-encoding"], "gzip");
    let compressed = response.bytes().await.unwrap();
    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(&compressed[..])
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, original);

    let response = client.get(server.url("/hello.txt")).send().await.unwrap();
    assert!(response.headers().get("content-encoding").is_none());
    assert_eq!(response.bytes().await.unwrap().to_vec(), original);
}

#[tokio::test]
async fn redirect_defaults_to_moved_permanently() {
    let mut config = base_config();
    config.serves.push(ServeConfig {
        error: Some(404),
        ..ServeConfig::default()
    });
    config.redirects.push(RedirectConfig {
        from: "/old".into(),
        to: "/new".into(),
        status: None,
    });
    config.redirects.push(RedirectConfig {
        from: "/temp".into(),
        to: "https://example.com/".into(),
        status: Some(307),
    });
    let server = spawn(config).await;
    let client = client();

    let response = client.get(server.url("/old")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "/new");

    let response = client.get(server.url("/temp")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "https://example.com/");
}

#[tokio::test]
async fn longest_prefix_routing() {
    let outer = tempfile::tempdir().unwrap();
    std::fs::create_dir(outer.path().join("b")).unwrap();
    std::fs::write(outer.path().join("b/c"), "outer").unwrap();
    let inner = tempfile::tempdir().unwrap();
    std::fs::write(inner.path().join("c"), "inner").unwrap();

    let mut config = base_config();
    config.serves.push(serve("/a/", outer.path()));
    config.serves.push(serve("/a/b/", inner.path()));
    let server = spawn(config).await;

    let response = client().get(server.url("/a/b/c")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "inner");
}

#[tokio::test]
async fn directory_redirects_and_request_ids() {
    let dir = site();
    let mut config = base_config();
    config.serves.push(serve("/", dir.path()));
    let server = spawn(config).await;

    let response = client().get(server.url("/docs")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "docs/");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn asterisk_request_is_rejected() {
    let dir = site();
    let mut config = base_config();
    config.serves.push(serve("/", dir.path()));
    let server = spawn(config).await;

    let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"OPTIONS * HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let response = String::from_utf8_lossy(&raw).to_lowercase();

    assert!(response.starts_with("http/1.1 400"));
    assert!(response.contains("connection: close"));
}

#[tokio::test]
async fn https_listener_serves_and_drains() {
    // reqwest and axum-server enable different rustls backends.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let dir = site();
    let tls = self_signed();
    let mut config = base_config();
    config.listeners[0].addr = "127.0.0.1:0".into();
    config.listeners[0].protocol = Protocol::Https;
    config.listeners[0].cert = Some(tls.path().join("cert.pem"));
    config.listeners[0].key = Some(tls.path().join("key.pem"));
    config.serves.push(serve("/", dir.path()));

    let server = HttpServer::new(&config).unwrap();
    let shutdown = Shutdown::with_grace(Duration::from_millis(200));
    let running = server.start(&shutdown).await.unwrap();
    let addr = running.local_addrs()[0];

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap();
    let response = client
        .get(format!("https://{addr}/page.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "<html><body>page</body></html>");
    drop(client);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), running.wait())
        .await
        .expect("listener did not drain")
        .unwrap();
}
