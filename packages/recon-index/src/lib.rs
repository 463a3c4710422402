mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client, RequestBuilder,
	header::{AUTHORIZATION, HeaderMap, HeaderName, USER_AGENT},
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Body of a `_search` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchBody {
	pub query: Value,
	pub size: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<usize>,
	#[serde(rename = "aggs", skip_serializing_if = "Option::is_none")]
	pub aggregations: Option<Map<String, Value>>,
}
impl SearchBody {
	pub fn new(query: Value, size: usize) -> Self {
		Self { query, size, from: None, aggregations: None }
	}
}

/// HTTP client scoped to one index of a search cluster.
#[derive(Debug, Clone)]
pub struct IndexClient {
	client: Client,
	url: String,
	index: String,
}
impl IndexClient {
	pub fn new(cfg: &recon_config::Index) -> Result<Self> {
		if cfg.name.trim().is_empty() {
			return Err(Error::InvalidConfig {
				message: "index name must be non-empty.".to_string(),
			});
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(default_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
			.build()?;

		Ok(Self {
			client,
			url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.name.clone(),
		})
	}

	pub fn index(&self) -> &str {
		&self.index
	}

	pub async fn search(&self, body: &SearchBody) -> Result<Value> {
		let url = format!("{}/{}/_search", self.url, self.index);

		tracing::debug!(
			index = %self.index,
			size = body.size,
			from = ?body.from,
			"Executing index search."
		);

		self.send(self.client.post(url).json(body)).await
	}

	pub async fn stats(&self) -> Result<Value> {
		let url = format!("{}/{}/_stats", self.url, self.index);

		self.send(self.client.get(url)).await
	}

	pub async fn cluster_health(&self) -> Result<Value> {
		let url = format!("{}/_cluster/health/{}", self.url, self.index);

		self.send(self.client.get(url)).await
	}

	async fn send(&self, request: RequestBuilder) -> Result<Value> {
		let res = request.send().await?;
		let status = res.status();
		let bytes = res.bytes().await?;

		if !status.is_success() {
			return Err(Error::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&bytes).into_owned(),
			});
		}

		serde_json::from_slice(&bytes).map_err(|err| Error::InvalidResponse {
			message: format!("Index response is not valid JSON: {err}."),
		})
	}
}

pub fn default_headers(api_key: Option<&str>, extra: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(USER_AGENT, recon_cli::user_agent().parse()?);

	if let Some(key) = api_key {
		headers.insert(AUTHORIZATION, format!("ApiKey {key}").parse()?);
	}

	for (key, value) in extra {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
