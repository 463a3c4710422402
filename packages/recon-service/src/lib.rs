pub mod freebase;
pub mod loader;
pub mod matching;
pub mod query;
pub mod scoring;
pub mod search;
pub mod status;

mod error;

pub use error::{Error, Result};
pub use freebase::{
	FreebaseEntity, FreebaseEntityResult, FreebaseEntitySuggestResponse, FreebaseManifest,
	FreebaseProperty, FreebasePropertySuggestResponse, FreebaseQueryResult, FreebaseResponse,
	FreebaseScoredEntity, FreebaseType, FreebaseTypeSuggestResponse,
};
pub use loader::IndexLoader;
pub use matching::{EntityMatches, MatchParams, MatchRequest, MatchResponse};
pub use scoring::{MatchingResult, NameOverlap, ScoredEntityResponse, ScoringAlgorithm};
pub use search::{
	EntityLoader, ResultEntities, SearchFacet, SearchFacetItem, SearchRequest, SearchResponse,
};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use recon_config::Config;
use recon_index::{IndexClient, SearchBody};
use recon_model::{Datasets, Model};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The search cluster, scoped to one index.
pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn index_name(&self) -> &str;

	fn search<'a>(&'a self, body: &'a SearchBody) -> BoxFuture<'a, recon_index::Result<Value>>;

	fn stats(&self) -> BoxFuture<'_, recon_index::Result<Value>>;

	fn cluster_health(&self) -> BoxFuture<'_, recon_index::Result<Value>>;
}

/// Where the dataset registry comes from.
pub trait DatasetSource
where
	Self: Send + Sync,
{
	fn datasets(&self) -> BoxFuture<'_, Result<Arc<Datasets>>>;
}

/// Registry fixed at startup from the `[[datasets]]` config entries.
#[derive(Debug, Clone)]
pub struct StaticDatasets {
	datasets: Arc<Datasets>,
}
impl StaticDatasets {
	pub fn new(datasets: Datasets) -> Self {
		Self { datasets: Arc::new(datasets) }
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		Ok(Self::new(Datasets::from_config(&cfg.datasets)?))
	}
}

impl DatasetSource for StaticDatasets {
	fn datasets(&self) -> BoxFuture<'_, Result<Arc<Datasets>>> {
		let datasets = self.datasets.clone();

		Box::pin(async move { Ok(datasets) })
	}
}

impl SearchIndex for IndexClient {
	fn index_name(&self) -> &str {
		self.index()
	}

	fn search<'a>(&'a self, body: &'a SearchBody) -> BoxFuture<'a, recon_index::Result<Value>> {
		Box::pin(IndexClient::search(self, body))
	}

	fn stats(&self) -> BoxFuture<'_, recon_index::Result<Value>> {
		Box::pin(IndexClient::stats(self))
	}

	fn cluster_health(&self) -> BoxFuture<'_, recon_index::Result<Value>> {
		Box::pin(IndexClient::cluster_health(self))
	}
}

pub struct ReconService {
	pub cfg: Config,
	pub model: Arc<Model>,
	pub index: Arc<dyn SearchIndex>,
	pub datasets: Arc<dyn DatasetSource>,
	pub algorithm: Arc<dyn ScoringAlgorithm>,
}
impl ReconService {
	pub fn new(
		cfg: Config,
		model: Arc<Model>,
		index: Arc<dyn SearchIndex>,
		datasets: Arc<dyn DatasetSource>,
		algorithm: Arc<dyn ScoringAlgorithm>,
	) -> Self {
		Self { cfg, model, index, datasets, algorithm }
	}

	/// Wires the HTTP index client, the configured model, the static dataset registry and the
	/// configured scoring algorithm.
	pub fn from_config(cfg: Config) -> Result<Self> {
		let model = Arc::new(Model::from_config(&cfg.model)?);
		let index = Arc::new(IndexClient::new(&cfg.index)?);
		let datasets = Arc::new(StaticDatasets::from_config(&cfg)?);
		let algorithm = scoring::algorithm_from_name(&cfg.scoring.algorithm)?;

		Ok(Self::new(cfg, model, index, datasets, algorithm))
	}
}
