use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value};

use recon_index::SearchBody;
use recon_model::{Datasets, Entity, Model, PropertyType};

use crate::{BoxFuture, Error, ReconService, Result, query};

/// Deepest result the index will page to.
pub const MAX_RESULT_WINDOW: usize = 10_000;

const DATASETS_FIELD: &str = "datasets";
const DATASETS_LABEL: &str = "Data sources";

/// Resolves references between entities for nested result rendering.
pub trait EntityLoader
where
	Self: Send + Sync,
{
	fn datasets(&self) -> BoxFuture<'_, Result<Arc<Datasets>>>;

	/// The entity's dict with referenced entities inlined.
	fn nested_dict<'a>(&'a self, entity: &'a Entity) -> BoxFuture<'a, Result<Map<String, Value>>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchFacetItem {
	pub name: String,
	pub label: String,
	pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchFacet {
	pub label: String,
	pub values: Vec<SearchFacetItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub results: Vec<Value>,
	pub facets: BTreeMap<String, SearchFacet>,
	pub total: Option<u64>,
	pub limit: usize,
	pub offset: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
	pub dataset: String,
	pub query: String,
	pub schema: Option<String>,
	pub filters: BTreeMap<String, Vec<String>>,
	pub limit: Option<usize>,
	pub offset: usize,
	pub fuzzy: bool,
	pub nested: bool,
}

/// Entities parsed out of one search response, in hit order.
pub struct ResultEntities {
	model: Arc<Model>,
	datasets: Arc<Datasets>,
	hits: std::vec::IntoIter<Value>,
}
impl ResultEntities {
	pub fn new(model: Arc<Model>, datasets: Arc<Datasets>, hits: Vec<Value>) -> Self {
		Self { model, datasets, hits: hits.into_iter() }
	}
}

impl Iterator for ResultEntities {
	type Item = (Entity, f64);

	fn next(&mut self) -> Option<Self::Item> {
		for hit in self.hits.by_ref() {
			if let (Some(entity), score) = result_entity(&self.model, &self.datasets, &hit) {
				return Some((entity, score));
			}
		}

		None
	}
}

/// Turns one search hit into an entity and its relevance score.
///
/// Hits without a source document yield `(None, 0.0)`. So do sources that no longer fit the
/// model, after a warning.
pub fn result_entity(model: &Model, datasets: &Datasets, hit: &Value) -> (Option<Entity>, f64) {
	let Some(source) = hit.get("_source").and_then(Value::as_object) else {
		return (None, 0.0);
	};
	let mut data = source.clone();

	if let Some(id) = hit.get("_id") {
		data.insert("id".to_string(), id.clone());
	}

	match Entity::from_data(&data, model, datasets) {
		Ok(entity) => (Some(entity), hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0)),
		Err(err) => {
			let id = hit.get("_id").and_then(Value::as_str);

			tracing::warn!(error = %err, id = ?id, "Skipping search hit that does not fit the model.");

			(None, 0.0)
		},
	}
}

/// Moves the hit list out of a search response.
pub fn take_hits(resp: &mut Value) -> Vec<Value> {
	match resp.pointer_mut("/hits/hits").map(Value::take) {
		Some(Value::Array(hits)) => hits,
		_ => Vec::new(),
	}
}

/// Facet listings for every aggregation in a search response.
pub fn build_facets(
	aggregations: Option<&Value>,
	datasets: &Datasets,
) -> BTreeMap<String, SearchFacet> {
	let Some(aggregations) = aggregations.and_then(Value::as_object) else {
		return BTreeMap::new();
	};
	let mut facets = BTreeMap::new();

	for (field, agg) in aggregations {
		let type_ = PropertyType::from_group(field);
		let label = if field == DATASETS_FIELD {
			DATASETS_LABEL.to_string()
		} else if let Some(type_) = type_ {
			type_.plural().to_string()
		} else {
			field.clone()
		};
		let buckets =
			agg.get("buckets").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
		let values = buckets
			.iter()
			.filter_map(|bucket| {
				let name = bucket_key(bucket.get("key")?)?;
				let label = if field == DATASETS_FIELD {
					datasets
						.get(&name)
						.map(|dataset| dataset.title.clone())
						.unwrap_or_else(|| name.clone())
				} else if let Some(type_) = type_ {
					type_.caption(&name)
				} else {
					name.clone()
				};
				let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);

				Some(SearchFacetItem { name, label, count })
			})
			.collect();

		facets.insert(field.clone(), SearchFacet { label, values });
	}

	facets
}

fn bucket_key(key: &Value) -> Option<String> {
	match key {
		Value::String(key) => Some(key.clone()),
		Value::Number(key) => Some(key.to_string()),
		Value::Bool(key) => Some(key.to_string()),
		_ => None,
	}
}

impl ReconService {
	/// Entities from a response the caller already holds. The hit list is moved out of `resp`.
	pub async fn result_entities(&self, resp: &mut Value) -> Result<ResultEntities> {
		let datasets = self.datasets.datasets().await?;

		Ok(ResultEntities::new(self.model.clone(), datasets, take_hits(resp)))
	}

	pub async fn query_entities(&self, query: Value, limit: usize) -> Result<ResultEntities> {
		let body = SearchBody::new(query, limit);
		let mut resp = self.index.search(&body).await?;

		self.result_entities(&mut resp).await
	}

	pub async fn query_results(
		&self,
		loader: &dyn EntityLoader,
		query: Value,
		limit: usize,
		nested: bool,
		offset: Option<usize>,
		aggregations: Option<Map<String, Value>>,
	) -> Result<SearchResponse> {
		let mut body = SearchBody::new(query, limit);

		body.from = offset;
		body.aggregations = aggregations;

		let mut resp = self.index.search(&body).await?;
		let datasets = loader.datasets().await?;
		let total = resp.pointer("/hits/total/value").and_then(Value::as_u64);
		let facets = build_facets(resp.get("aggregations"), &datasets);
		let entities = ResultEntities::new(self.model.clone(), datasets, take_hits(&mut resp));
		let mut results = Vec::new();

		for (entity, score) in entities {
			let mut data =
				if nested { loader.nested_dict(&entity).await? } else { entity.to_dict() };

			data.insert("score".to_string(), Value::from(score));
			results.push(Value::Object(data));
		}

		tracing::debug!(
			index = self.index.index_name(),
			results = results.len(),
			total = ?total,
			"Search results assembled."
		);

		Ok(SearchResponse { results, facets, total, limit, offset })
	}

	/// Free-text search within one dataset.
	pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
		let datasets = self.datasets.datasets().await?;
		let dataset = datasets.get(&request.dataset).ok_or_else(|| Error::NotFound {
			message: format!("No such dataset: {}.", request.dataset),
		})?;
		let schema = match request.schema.as_deref().filter(|name| !name.is_empty()) {
			Some(name) => Some(self.model.get(name).ok_or_else(|| Error::InvalidRequest {
				message: format!("Unknown schema: {name}."),
			})?),
			None => None,
		};
		let limit =
			request.limit.unwrap_or(self.cfg.search.default_limit).min(self.cfg.search.max_limit);

		if request.offset.saturating_add(limit) > MAX_RESULT_WINDOW {
			return Err(Error::InvalidRequest {
				message: format!("offset + limit must not exceed {MAX_RESULT_WINDOW}."),
			});
		}

		let query = query::text_query(
			&self.model,
			dataset,
			&request.query,
			schema.as_deref(),
			&request.filters,
			request.fuzzy,
		);
		let aggregations = if self.cfg.search.facets.is_empty() {
			None
		} else {
			Some(query::facet_aggregations(&self.cfg.search.facets))
		};
		let loader = self.loader();

		self.query_results(
			&loader,
			query,
			limit,
			request.nested,
			Some(request.offset),
			aggregations,
		)
		.await
	}
}
