use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub index: Index,
	pub search: Search,
	pub scoring: Scoring,
	pub reconcile: Reconcile,
	#[serde(default)]
	pub model: Model,
	pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Index {
	/// Base URL of the search cluster, without a trailing slash.
	pub url: String,
	/// Name of the index holding entity documents.
	pub name: String,
	pub timeout_ms: u64,
	/// Optional. Sent as `Authorization: ApiKey <key>`.
	pub api_key: Option<String>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub default_limit: usize,
	pub max_limit: usize,
	/// Fields aggregated into facets on every text search.
	pub facets: Vec<String>,
	/// Candidates fetched per requested match result.
	pub match_candidates: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scoring {
	pub algorithm: String,
	pub threshold: f64,
	pub cutoff: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reconcile {
	pub title: String,
	pub identifier_space: String,
	pub schema_space: String,
	/// `{{id}}` is substituted by the client.
	pub view_url: String,
	pub preview_width: u32,
	pub preview_height: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Model {
	/// Optional. JSON model document; the embedded default model is used when absent.
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
	pub name: String,
	pub title: String,
	#[serde(default)]
	pub children: Vec<String>,
}
