//! In-process HTTP sink for delivery tests: accepts POSTs, records bodies,
//! and answers according to the configured mode.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone, Copy)]
pub enum SinkMode {
    /// Respond 200 to every request.
    Ok,
    /// Respond with the given status code.
    Reject(u16),
    /// Read the request, then never respond (forces a client timeout).
    Stall,
}

pub struct StubSink {
    pub url: String,
    bodies: Arc<Mutex<Vec<String>>>,
    requests: Arc<AtomicUsize>,
}

impl StubSink {
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub async fn spawn_sink(mode: SinkMode) -> StubSink {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let bodies: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let requests = Arc::new(AtomicUsize::new(0));

    let task_bodies = bodies.clone();
    let task_requests = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let bodies = task_bodies.clone();
            let requests = task_requests.clone();
            tokio::spawn(async move {
                let mut buf: Vec<u8> = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                    let Some(header_end) = find_header_end(&buf) else {
                        continue;
                    };
                    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
                    let body_len = content_length(&headers);
                    if buf.len() < header_end + 4 + body_len {
                        continue;
                    }
                    requests.fetch_add(1, Ordering::SeqCst);
                    let body =
                        String::from_utf8_lossy(&buf[header_end + 4..header_end + 4 + body_len])
                            .to_string();
                    match mode {
                        SinkMode::Ok => {
                            bodies.lock().unwrap().push(body);
                            let _ = socket
                                .write_all(
                                    b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                                )
                                .await;
                        }
                        SinkMode::Reject(status) => {
                            let response = format!(
                                "HTTP/1.1 {status} NO\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                        }
                        SinkMode::Stall => {
                            // Hold the connection open without answering.
                            tokio::time::sleep(Duration::from_secs(60)).await;
                        }
                    }
                    return;
                }
            });
        }
    });

    StubSink {
        url: format!("http://127.0.0.1:{port}/cart"),
        bodies,
        requests,
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0)
}
