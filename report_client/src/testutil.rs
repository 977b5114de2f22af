//! Loopback HTTP server used by tests that exercise the real `reqwest` clients.
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Request as received by the test server.
pub struct Captured {
    /// Request line and headers.
    pub head: String,
    /// Request body.
    pub body: String,
}

/// Serve exactly one HTTP response on a loopback port.
///
/// Returns the base URL and a handle yielding the captured request.
pub fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(&stream);

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let end = line == "\r\n" || line.is_empty();
            head.push_str(&line);
            if end {
                break;
            }
        }
        let mut raw_body = vec![0u8; content_length];
        reader.read_exact(&mut raw_body).unwrap();

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        (&stream).write_all(response.as_bytes()).unwrap();
        Captured {
            head,
            body: String::from_utf8(raw_body).unwrap(),
        }
    });
    (format!("http://{}", addr), handle)
}
