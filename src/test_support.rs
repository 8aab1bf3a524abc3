use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde_json::Value;

const ACCEPT_DEADLINE: Duration = Duration::from_secs(5);
const IO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Minimal HTTP/1.1 responder that answers one canned response per connection.
pub struct GraphqlStub {
    pub url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl GraphqlStub {
    pub fn spawn(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("stub listener should bind");
        listener
            .set_nonblocking(true)
            .expect("stub listener should switch to non-blocking");
        let port = listener
            .local_addr()
            .expect("stub addr should be available")
            .port();

        let handle = std::thread::spawn(move || {
            let mut recorded = Vec::new();

            for response in responses {
                let Some(mut stream) = accept_with_deadline(&listener) else {
                    break;
                };
                let request = read_request(&mut stream);
                write_response(&mut stream, &response);
                recorded.push(request);
            }

            recorded
        });

        Self {
            url: format!("http://127.0.0.1:{port}/v1/graphql/"),
            handle,
        }
    }

    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle
            .join()
            .expect("stub responder thread should terminate cleanly")
    }
}

fn accept_with_deadline(listener: &TcpListener) -> Option<TcpStream> {
    let deadline = Instant::now() + ACCEPT_DEADLINE;

    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream
                    .set_nonblocking(false)
                    .expect("accepted stream should switch to blocking");
                stream
                    .set_read_timeout(Some(IO_TIMEOUT))
                    .expect("read timeout should be configurable");
                return Some(stream);
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return None,
        }
    }
}

fn read_request(stream: &mut TcpStream) -> RecordedRequest {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];

    let header_end = loop {
        if let Some(position) = find_header_end(&buffer) {
            break position;
        }
        let size = stream.read(&mut chunk).expect("request should be readable");
        if size == 0 {
            break buffer.len();
        }
        buffer.extend_from_slice(&chunk[..size]);
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let headers: Vec<(String, String)> = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = (header_end + 4).min(buffer.len());
    let mut body = buffer[body_start..].to_vec();
    while body.len() < content_length {
        let size = stream.read(&mut chunk).expect("request body should be readable");
        if size == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..size]);
    }

    RecordedRequest {
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn write_response(stream: &mut TcpStream, response: &StubResponse) {
    let reason = match response.status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "Status",
    };
    let payload = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        reason,
        response.body.len(),
        response.body
    );

    stream
        .write_all(payload.as_bytes())
        .expect("stub response should be written");
    stream.flush().expect("stub response should flush");
}
