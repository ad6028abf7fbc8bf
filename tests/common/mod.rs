//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use waypost::{CancellationToken, Error, Logger, Server};

/// In-memory sink for JSON log lines.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl Capture {
    pub fn logger(&self) -> Logger {
        let sink = self.clone();
        Logger::new(
            tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_writer(move || sink.clone())
                .finish(),
        )
    }

    pub fn records(&self) -> Vec<serde_json::Value> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records()
            .iter()
            .filter_map(|r| r["message"].as_str().map(str::to_owned))
            .collect()
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.records().into_iter().filter(|r| r["message"] == "request").collect()
    }
}

/// A server running on a background task.
pub struct Running {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub task: JoinHandle<Result<(), Error>>,
}

/// Starts `server` and waits until it is accepting connections.
pub async fn spawn(server: Server) -> Running {
    let handle = server.handle();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(server.run(shutdown.clone()));
    let addr = handle.listening().await.expect("server never bound");
    Running { addr, shutdown, task }
}

/// Sends a raw HTTP/1.1 GET and returns the whole response as text.
pub async fn get(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;

    let mut req = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n");
    for (name, value) in headers {
        req.push_str(&format!("{name}: {value}\r\n"));
    }
    req.push_str("\r\n");
    stream.write_all(req.as_bytes()).await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Value of `name` in a raw response, header names compared case-insensitively.
pub fn header<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split("\r\n\r\n")
        .next()?
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
        .map(|(_, v)| v.trim())
}

pub fn body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}
