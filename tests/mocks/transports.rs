//! In-process transports for tests that never touch the network

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agency_gateway::{CallError, OutboundRequest, Transport, TransportResponse};
use async_trait::async_trait;

type Reply = Result<TransportResponse, CallError>;

#[derive(Debug)]
struct Route {
	url_fragment: String,
	replies: VecDeque<Reply>,
	fallback: Option<Reply>,
}

/// Transport answering from per-URL scripts and counting every call
///
/// A route matches when the request URL contains its fragment. Each route
/// pops replies in order and then keeps answering with its last reply.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
	routes: Arc<Mutex<Vec<Route>>>,
	calls: Arc<AtomicUsize>,
	requests: Arc<Mutex<Vec<OutboundRequest>>>,
}

impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn route(self, url_fragment: &str, replies: Vec<Reply>) -> Self {
		self.routes.lock().unwrap().push(Route {
			url_fragment: url_fragment.to_string(),
			replies: replies.into(),
			fallback: None,
		});
		self
	}

	pub fn route_json(self, url_fragment: &str, status: u16, body: serde_json::Value) -> Self {
		self.route(url_fragment, vec![Ok(TransportResponse::new(status, body.to_string()))])
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> Vec<OutboundRequest> {
		self.requests.lock().unwrap().clone()
	}

	pub fn calls_to(&self, url_fragment: &str) -> usize {
		self.requests()
			.iter()
			.filter(|request| request.url.contains(url_fragment))
			.count()
	}
}

#[async_trait]
impl Transport for ScriptedTransport {
	async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, CallError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let url = request.url.clone();
		self.requests.lock().unwrap().push(request);

		let mut routes = self.routes.lock().unwrap();
		let route = routes
			.iter_mut()
			.find(|route| url.contains(&route.url_fragment));

		match route {
			Some(route) => match route.replies.pop_front() {
				Some(reply) => {
					route.fallback = Some(reply.clone());
					reply
				},
				None => route
					.fallback
					.clone()
					.unwrap_or_else(|| Ok(TransportResponse::new(404, "no reply"))),
			},
			None => Ok(TransportResponse::new(404, format!("no route for {}", url))),
		}
	}
}
