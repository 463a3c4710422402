//! A local HTTP server that answers the handful of search-cluster endpoints the index client
//! uses, and records every request it receives.

mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	future::IntoFuture,
	sync::{Arc, Mutex, MutexGuard},
};

use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, Method, StatusCode, Uri},
	response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use recon_config::{Config, DatasetConfig, Index, Model, Reconcile, Scoring, Search, Service};

/// Index name used by [`test_config`].
pub const TEST_INDEX: &str = "recon-test";

#[derive(Debug, Clone)]
pub struct StubReply {
	pub status: u16,
	pub body: Value,
}
impl StubReply {
	pub fn ok(body: Value) -> Self {
		Self { status: 200, body }
	}

	pub fn status(status: u16, body: Value) -> Self {
		Self { status, body }
	}
}

#[derive(Debug, Clone)]
pub struct StubResponses {
	pub search: StubReply,
	pub stats: StubReply,
	pub health: StubReply,
}
impl StubResponses {
	/// Empty result set, a green cluster and zeroed index statistics.
	pub fn new(index: &str) -> Self {
		Self {
			search: StubReply::ok(search_response(Vec::new(), Some(0))),
			stats: StubReply::ok(serde_json::json!({
				"_all": { "primaries": { "docs": { "count": 0 } } },
				"indices": { index: { "primaries": { "docs": { "count": 0 } } } }
			})),
			health: StubReply::ok(serde_json::json!({ "status": "green" })),
		}
	}

	pub fn with_search(mut self, body: Value) -> Self {
		self.search = StubReply::ok(body);

		self
	}

	pub fn with_stats(mut self, body: Value) -> Self {
		self.stats = StubReply::ok(body);

		self
	}

	pub fn with_health(mut self, reply: StubReply) -> Self {
		self.health = reply;

		self
	}
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub headers: Vec<(String, String)>,
	pub body: Option<Value>,
}
impl RecordedRequest {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

struct StubState {
	index: String,
	responses: Mutex<StubResponses>,
	queued_searches: Mutex<VecDeque<StubReply>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

pub struct StubIndex {
	url: String,
	state: Arc<StubState>,
	shutdown: Option<Sender<()>>,
}
impl StubIndex {
	pub async fn start(index: &str, responses: StubResponses) -> Result<Self> {
		let state = Arc::new(StubState {
			index: index.to_string(),
			responses: Mutex::new(responses),
			queued_searches: Mutex::new(VecDeque::new()),
			requests: Mutex::new(Vec::new()),
		});
		let app = Router::new().fallback(handle).with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { url: format!("http://{addr}"), state, shutdown: Some(tx) })
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn index(&self) -> &str {
		&self.state.index
	}

	/// Answers the next search with `body` instead of the default search reply.
	pub fn queue_search(&self, body: Value) {
		lock(&self.state.queued_searches).push_back(StubReply::ok(body));
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		lock(&self.state.requests).clone()
	}

	pub fn search_bodies(&self) -> Vec<Value> {
		lock(&self.state.requests)
			.iter()
			.filter(|request| request.path.ends_with("/_search"))
			.filter_map(|request| request.body.clone())
			.collect()
	}
}
impl Drop for StubIndex {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// A complete configuration pointing at `index_url`, with three datasets: the leaves
/// `us_ofac_sdn` and `eu_fsf`, and the collection `sanctions` holding both.
pub fn test_config(index_url: &str) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		index: Index {
			url: index_url.to_string(),
			name: TEST_INDEX.to_string(),
			timeout_ms: 5_000,
			api_key: None,
			default_headers: Map::new(),
		},
		search: Search {
			default_limit: 10,
			max_limit: 50,
			facets: vec!["countries".to_string(), "datasets".to_string()],
			match_candidates: 3,
		},
		scoring: Scoring { algorithm: "name-overlap".to_string(), threshold: 0.7, cutoff: 0.0 },
		reconcile: Reconcile {
			title: "Recon".to_string(),
			identifier_space: "https://recon.example.org/entities/".to_string(),
			schema_space: "https://recon.example.org/schema/".to_string(),
			view_url: "https://recon.example.org/entities/{{id}}".to_string(),
			preview_width: 430,
			preview_height: 300,
		},
		model: Model::default(),
		datasets: vec![
			dataset("us_ofac_sdn", "US OFAC Specially Designated Nationals", &[]),
			dataset("eu_fsf", "EU Financial Sanctions Files", &[]),
			dataset("sanctions", "Consolidated Sanctions", &["us_ofac_sdn", "eu_fsf"]),
		],
	}
}

fn dataset(name: &str, title: &str, children: &[&str]) -> DatasetConfig {
	DatasetConfig {
		name: name.to_string(),
		title: title.to_string(),
		children: children.iter().map(|child| child.to_string()).collect(),
	}
}

/// A `_search` response with the given hits.
pub fn search_response(hits: Vec<Value>, total: Option<u64>) -> Value {
	let mut hits_obj = serde_json::json!({ "hits": hits });

	if let Some(total) = total {
		hits_obj["total"] = serde_json::json!({ "value": total, "relation": "eq" });
	}

	serde_json::json!({ "took": 1, "timed_out": false, "hits": hits_obj })
}

/// A single search hit.
pub fn hit(id: &str, score: f64, source: Value) -> Value {
	serde_json::json!({ "_id": id, "_score": score, "_source": source })
}

async fn handle(
	State(state): State<Arc<StubState>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let path = uri.path().to_string();
	let recorded = RecordedRequest {
		method: method.to_string(),
		path: path.clone(),
		headers: headers
			.iter()
			.filter_map(|(key, value)| {
				value.to_str().ok().map(|value| (key.as_str().to_string(), value.to_string()))
			})
			.collect(),
		body: if body.is_empty() { None } else { serde_json::from_slice(&body).ok() },
	};

	lock(&state.requests).push(recorded);

	let reply = if method == Method::POST && path == format!("/{}/_search", state.index) {
		lock(&state.queued_searches)
			.pop_front()
			.unwrap_or_else(|| lock(&state.responses).search.clone())
	} else if method == Method::GET && path == format!("/{}/_stats", state.index) {
		lock(&state.responses).stats.clone()
	} else if method == Method::GET && path == format!("/_cluster/health/{}", state.index) {
		lock(&state.responses).health.clone()
	} else {
		let message = format!("no stub for {method} {path}");

		StubReply::status(404, serde_json::json!({ "error": message }))
	};
	let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, Json(reply.body)).into_response()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
