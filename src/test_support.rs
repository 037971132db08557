//! Local network stubs shared by the async tests

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// HTTP server answering every request with a fixed status and body
pub struct HttpStub {
    pub addr: SocketAddr,
    /// Request heads received so far, request line first
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl HttpStub {
    /// Request lines received so far (`GET /path?query HTTP/1.1`)
    pub fn request_lines(&self) -> Vec<String> {
        self.heads()
            .iter()
            .filter_map(|head| head.lines().next().map(str::to_string))
            .collect()
    }

    /// Header lines of every request received so far
    pub fn header_lines(&self) -> Vec<String> {
        self.heads()
            .iter()
            .flat_map(|head| head.lines().skip(1).map(str::to_string).collect::<Vec<_>>())
            .filter(|line| !line.is_empty())
            .collect()
    }

    fn heads(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Serve `status` with `body` on a random local port. Works both as an
/// origin server and as a plain HTTP proxy, since proxied GETs arrive in
/// absolute form on the same socket.
pub async fn spawn_http_stub(status: u16, body: &str) -> HttpStub {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let body = body.to_string();

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let seen = Arc::clone(&seen);
            let body = body.clone();
            tokio::spawn(async move {
                respond(socket, status, &body, seen).await;
            });
        }
    });

    HttpStub { addr, requests }
}

async fn respond(mut socket: TcpStream, status: u16, body: &str, seen: Arc<Mutex<Vec<String>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    if let Ok(mut seen) = seen.lock() {
        seen.push(head);
    }

    let response = format!(
        "HTTP/1.1 {} STUB\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Accept connections and never answer them
pub async fn spawn_silent_stub() -> HttpStub {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    HttpStub {
        addr,
        requests: Arc::new(Mutex::new(Vec::new())),
    }
}

/// A local port with nothing listening on it
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
