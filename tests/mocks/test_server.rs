//! Scripted HTTP server for integration tests
//!
//! Serves canned responses in order over plain TCP and records every request
//! it receives, so tests can drive the real reqwest transport end to end.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request as seen on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub headers: Vec<(String, String)>,
	pub body: String,
}

impl RecordedRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Status and body returned for one request
#[derive(Debug, Clone)]
pub struct ScriptedReply {
	pub status: u16,
	pub body: String,
}

impl ScriptedReply {
	pub fn json(status: u16, body: serde_json::Value) -> Self {
		Self {
			status,
			body: body.to_string(),
		}
	}

	pub fn text(status: u16, body: &str) -> Self {
		Self {
			status,
			body: body.to_string(),
		}
	}
}

#[derive(Debug, Default)]
struct ServerState {
	replies: VecDeque<ScriptedReply>,
	requests: Vec<RecordedRequest>,
}

/// Test server instance bound to an ephemeral local port
pub struct TestServer {
	pub base_url: String,
	pub handle: JoinHandle<()>,
	state: Arc<Mutex<ServerState>>,
}

impl TestServer {
	/// Spawn a server answering with `replies` in order; once they run out it
	/// answers 404
	pub async fn spawn(replies: Vec<ScriptedReply>) -> Result<Self, Box<dyn std::error::Error>> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let state = Arc::new(Mutex::new(ServerState {
			replies: replies.into(),
			requests: Vec::new(),
		}));

		let server_state = Arc::clone(&state);
		let handle = tokio::spawn(async move {
			while let Ok((stream, _)) = listener.accept().await {
				let state = Arc::clone(&server_state);
				tokio::spawn(async move {
					let _ = handle_connection(stream, state).await;
				});
			}
		});

		Ok(Self {
			base_url: format!("http://{}", addr),
			handle,
			state,
		})
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.state.lock().unwrap().requests.clone()
	}

	pub fn request_count(&self) -> usize {
		self.state.lock().unwrap().requests.len()
	}

	pub fn abort(&self) {
		self.handle.abort();
	}
}

impl Drop for TestServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

async fn handle_connection(
	mut stream: TcpStream,
	state: Arc<Mutex<ServerState>>,
) -> std::io::Result<()> {
	let mut buffer = Vec::new();
	let mut chunk = [0u8; 4096];

	let header_end = loop {
		let read = stream.read(&mut chunk).await?;
		if read == 0 {
			return Ok(());
		}
		buffer.extend_from_slice(&chunk[..read]);
		if let Some(pos) = find_subslice(&buffer, b"\r\n\r\n") {
			break pos;
		}
	};

	let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
	let mut lines = head.split("\r\n");
	let request_line = lines.next().unwrap_or_default();
	let mut parts = request_line.split_whitespace();
	let method = parts.next().unwrap_or_default().to_string();
	let path = parts.next().unwrap_or_default().to_string();

	let headers: Vec<(String, String)> = lines
		.filter_map(|line| line.split_once(':'))
		.map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
		.collect();
	let content_length = headers
		.iter()
		.find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
		.and_then(|(_, value)| value.parse::<usize>().ok())
		.unwrap_or(0);

	let body_start = header_end + 4;
	while buffer.len() < body_start + content_length {
		let read = stream.read(&mut chunk).await?;
		if read == 0 {
			break;
		}
		buffer.extend_from_slice(&chunk[..read]);
	}
	let body_end = (body_start + content_length).min(buffer.len());
	let body = String::from_utf8_lossy(&buffer[body_start..body_end]).to_string();

	let reply = {
		let mut state = state.lock().unwrap();
		state.requests.push(RecordedRequest {
			method,
			path,
			headers,
			body,
		});
		state
			.replies
			.pop_front()
			.unwrap_or_else(|| ScriptedReply::text(404, "no scripted reply"))
	};

	let response = format!(
		"HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
		reply.status,
		reply.body.len(),
		reply.body
	);
	stream.write_all(response.as_bytes()).await?;
	stream.shutdown().await
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}
