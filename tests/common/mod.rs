//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;

use filegate::config::{ListenerConfig, ServeConfig, ServerConfig};
use filegate::http::RunningServer;
use filegate::{HttpServer, Shutdown};

/// A server bound to an ephemeral local port. Dropping it stops the listeners.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: Shutdown,
    _running: RunningServer,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start `config` with its single listener moved to `127.0.0.1:0`.
pub async fn spawn(mut config: ServerConfig) -> TestServer {
    for listener in &mut config.listeners {
        listener.addr = "127.0.0.1:0".into();
    }
    config.sanitise();

    let server = HttpServer::new(&config).unwrap();
    let shutdown = Shutdown::new();
    let running = server.start(&shutdown).await.unwrap();
    TestServer {
        addr: running.local_addrs()[0],
        _shutdown: shutdown,
        _running: running,
    }
}

/// One plaintext listener and no routes yet.
pub fn base_config() -> ServerConfig {
    ServerConfig {
        listeners: vec![ListenerConfig::default()],
        ..ServerConfig::default()
    }
}

pub fn serve(path: &str, target: &Path) -> ServeConfig {
    ServeConfig {
        path: path.into(),
        target: Some(target.to_path_buf()),
        ..ServeConfig::default()
    }
}

/// Client that reports redirects instead of following them, and never
/// decompresses bodies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// A self-signed certificate for `localhost` and `127.0.0.1`, written as
/// `cert.pem` and `key.pem`.
pub fn self_signed() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()]).unwrap();
    std::fs::write(dir.path().join("cert.pem"), certified.cert.pem()).unwrap();
    std::fs::write(dir.path().join("key.pem"), certified.key_pair.serialize_pem()).unwrap();
    dir
}

/// A directory tree used by most tests:
///
/// ```text
/// hello.txt
/// page.html
/// docs/index.html
/// files/one.txt
/// files/two.txt
/// ```
pub fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello from filegate\n".repeat(20)).unwrap();
    std::fs::write(dir.path().join("page.html"), "<html><body>page</body></html>").unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/index.html"), "<h1>docs</h1>").unwrap();
    std::fs::create_dir(dir.path().join("files")).unwrap();
    std::fs::write(dir.path().join("files/one.txt"), "1").unwrap();
    std::fs::write(dir.path().join("files/two.txt"), "2").unwrap();
    dir
}
