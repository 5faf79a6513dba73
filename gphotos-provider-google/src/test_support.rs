//! One-shot HTTP stub for exercising the provider against a local socket.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What the stub received.
pub struct Captured {
    pub request_line: String,
    /// Header lines as sent, without the trailing CRLF.
    pub headers: Vec<String>,
    pub body: String,
}

impl Captured {
    /// Value of header `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then_some(value.trim())
        })
    }
}

/// Serves one request at `http://127.0.0.1:<port><path>` with `status` and
/// `body`. The handle yields the captured request.
pub async fn serve_once(
    path: &str,
    status: &'static str,
    body: &'static str,
) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}{path}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                break;
            }
            headers.push(line);
        }

        let mut captured = Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::new(),
        };

        let length: usize = captured
            .header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let mut raw = vec![0; length];
        reader.read_exact(&mut raw).await.unwrap();
        captured.body = String::from_utf8_lossy(&raw).into_owned();

        let mut stream = reader.into_inner();
        let response = format!(
            "HTTP/1.1 {status}\r\n\
            Content-Type: application/json\r\n\
            Content-Length: {}\r\n\
            Connection: close\r\n\
            \r\n\
            {body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();

        captured
    });

    (url, handle)
}
