//! HTTP server for the performance API.

use anyhow::Result;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use url::Url;

use super::types::ApiResponse;
use crate::auth::{LogOtpSender, OtpSender};
use crate::config::ServerConfig;
use crate::db::Database;
use crate::error::TrackerError;

/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A parsed HTTP request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    /// Percent-decoded path segments, e.g. `["api", "employees", "E1"]`
    pub segments: Vec<String>,
    pub query: HashMap<String, String>,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Build a request from a method and a request target like `/api/x?y=1`.
    /// Targets that do not parse as an origin-form path route nowhere.
    pub fn new(method: &str, target: &str) -> Self {
        let parsed = target
            .starts_with('/')
            .then(|| Url::parse(&format!("http://localhost{}", target)).ok())
            .flatten();

        let (segments, query) = match parsed {
            Some(url) => {
                let segments = url
                    .path_segments()
                    .map(|segs| segs.filter(|s| !s.is_empty()).map(decode_segment).collect())
                    .unwrap_or_default();
                let query = url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                (segments, query)
            }
            None => (Vec::new(), HashMap::new()),
        };

        Self {
            method: method.to_uppercase(),
            segments,
            query,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Non-empty query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A response ready to be written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status: u16, data: T) -> Self {
        Self::envelope(status, &ApiResponse::ok(data))
    }

    pub fn error(err: &TrackerError) -> Self {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!(error = %err, "request failed");
        }
        Self::envelope::<()>(status, &ApiResponse::err(err.to_string()))
    }

    pub fn not_found() -> Self {
        Self::envelope::<()>(404, &ApiResponse::err("Not Found"))
    }

    pub fn csv(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/csv",
            body,
        }
    }

    fn envelope<T: Serialize>(status: u16, payload: &ApiResponse<T>) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => Self {
                status: 500,
                content_type: "application/json",
                body: format!(r#"{{"success":false,"error":"{}"}}"#, e),
            },
        }
    }
}

/// HTTP server for the performance API.
pub struct ApiServer {
    pub(super) db_path: PathBuf,
    pub(super) config: ServerConfig,
    pub(super) start_time: Instant,
    pub(super) otp_sender: Box<dyn OtpSender + Send + Sync>,
}

impl ApiServer {
    pub fn new(db_path: PathBuf, config: ServerConfig) -> Self {
        Self {
            db_path,
            config,
            start_time: Instant::now(),
            otp_sender: Box::new(LogOtpSender),
        }
    }

    pub fn with_otp_sender(mut self, sender: Box<dyn OtpSender + Send + Sync>) -> Self {
        self.otp_sender = sender;
        self
    }

    /// Start the server (blocking).
    pub fn start(&self, shutdown: Arc<AtomicBool>) -> Result<()> {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", self.config.port))?;
        listener.set_nonblocking(true)?;

        tracing::info!(port = self.config.port, db = %self.db_path.display(), "API server listening");

        while !shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    if let Err(e) = self.handle_connection(stream, peer_addr) {
                        tracing::warn!(peer = %peer_addr, error = %e, "request error");
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept error");
                }
            }
        }

        tracing::info!("API server stopped");
        Ok(())
    }

    fn handle_connection(&self, mut stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(std::time::Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(std::time::Duration::from_secs(30)))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() < 2 {
            let response = HttpResponse::error(&TrackerError::invalid("Bad Request"));
            return write_response(&mut stream, &response);
        }

        let mut request = HttpRequest::new(parts[0], parts[1]);
        let mut content_length = 0usize;

        loop {
            let mut header_line = String::new();
            reader.read_line(&mut header_line)?;
            let header_line = header_line.trim();
            if header_line.is_empty() {
                break;
            }
            if let Some((key, value)) = header_line.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_string();
                if key == "content-length" {
                    content_length = value.parse().unwrap_or(0);
                }
                request.headers.insert(key, value);
            }
        }

        if content_length > MAX_BODY_BYTES {
            let response = HttpResponse::error(&TrackerError::invalid("request body too large"));
            return write_response(&mut stream, &response);
        }

        let mut body = vec![0u8; content_length];
        if content_length > 0 {
            std::io::Read::read_exact(&mut reader, &mut body)?;
        }
        request.body = body;

        let started = Instant::now();
        let response = match Database::open_at(self.db_path.clone()) {
            Ok(db) => self.dispatch(&db, &request),
            Err(e) => {
                tracing::error!(error = %e, "could not open database");
                HttpResponse::error(&TrackerError::Storage(rusqlite::Error::InvalidPath(
                    self.db_path.clone(),
                )))
            }
        };

        tracing::info!(
            peer = %peer_addr,
            method = %request.method,
            path = %format!("/{}", request.segments.join("/")),
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );

        write_response(&mut stream, &response)
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn write_response(stream: &mut TcpStream, response: &HttpResponse) -> Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        status_text(response.status),
        response.content_type,
        response.body.len()
    );

    stream.write_all(head.as_bytes())?;
    stream.write_all(response.body.as_bytes())?;
    stream.flush()?;
    Ok(())
}

fn decode_segment(segment: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}
