//! Skips network tests when the sandbox forbids binding local sockets.

use std::net::TcpListener;

use wiremock::MockServer;

/// True when a loopback listener can be bound.
pub fn loopback_available() -> bool {
    match TcpListener::bind("127.0.0.1:0") {
        Ok(_) => true,
        Err(e) => {
            eprintln!("skipping: cannot bind loopback socket ({e})");
            false
        }
    }
}

/// Starts a mock server, or returns `None` when sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if !loopback_available() {
        return None;
    }
    Some(MockServer::start().await)
}

/// URL on a loopback port nothing is listening on.
pub fn closed_port_url(path: &str) -> Option<String> {
    let listener = TcpListener::bind("127.0.0.1:0").ok()?;
    let addr = listener.local_addr().ok()?;
    drop(listener);
    Some(format!("http://{addr}{path}"))
}
