//! One-shot HTTP server for exercising the blocking clients against canned
//! responses.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// A server that answers exactly one request and then shuts down.
pub struct OneShotServer {
    url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    /// Base URL of the server, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the request to be served and returns it as received
    /// (request line, headers with lowercased names, blank line, body).
    pub fn request(self) -> String {
        self.handle.join().expect("server thread panicked")
    }
}

/// Binds a local port and replies to the first request with `status`,
/// `content_type` and `body`.
pub fn serve_once(status: u16, content_type: &str, body: &str) -> OneShotServer {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind local port");
    let addr = listener.local_addr().expect("local address");
    let response = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        reason(status),
        body.len(),
    );

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream);

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request line");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let line = match line.split_once(':') {
                Some((name, value)) => format!("{}:{value}", name.to_ascii_lowercase()),
                None => line,
            };
            if let Some(value) = line.strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
            head.push_str(&line);
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("read request body");

        let mut stream = reader.into_inner();
        stream
            .write_all(response.as_bytes())
            .expect("write response");
        let _ = stream.flush();

        format!("{head}\r\n{}", String::from_utf8_lossy(&body))
    });

    OneShotServer {
        url: format!("http://{addr}"),
        handle,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
