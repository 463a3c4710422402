use std::{
	collections::{BTreeMap, BTreeSet},
	sync::Arc,
};

use serde_json::{Map, Value};

use recon_index::SearchBody;
use recon_model::{Datasets, Entity, Model, PropertyType};

use crate::{
	BoxFuture, DatasetSource, ReconService, Result, SearchIndex,
	search::{EntityLoader, ResultEntities, take_hits},
};

/// Inlines entities referenced through entity-typed properties, one level deep.
#[derive(Clone)]
pub struct IndexLoader {
	model: Arc<Model>,
	index: Arc<dyn SearchIndex>,
	datasets: Arc<dyn DatasetSource>,
}
impl IndexLoader {
	pub fn new(
		model: Arc<Model>,
		index: Arc<dyn SearchIndex>,
		datasets: Arc<dyn DatasetSource>,
	) -> Self {
		Self { model, index, datasets }
	}

	async fn load_entities(&self, ids: Vec<String>) -> Result<BTreeMap<String, Entity>> {
		let size = ids.len();
		let body = SearchBody::new(serde_json::json!({ "ids": { "values": ids } }), size);
		let mut resp = self.index.search(&body).await?;
		let datasets = self.datasets.datasets().await?;

		Ok(ResultEntities::new(self.model.clone(), datasets, take_hits(&mut resp))
			.map(|(entity, _)| (entity.id.clone(), entity))
			.collect())
	}

	async fn expand(&self, entity: &Entity) -> Result<Map<String, Value>> {
		let refs: BTreeSet<String> = entity
			.itervalues()
			.filter(|(prop, value)| prop.type_ == PropertyType::Entity && *value != entity.id)
			.map(|(_, value)| value.to_string())
			.collect();

		if refs.is_empty() {
			return Ok(entity.to_dict());
		}

		let loaded = self.load_entities(refs.into_iter().collect()).await?;
		let mut properties = Map::new();

		for (name, values) in &entity.properties {
			let is_ref =
				entity.schema.get(name).is_some_and(|prop| prop.type_ == PropertyType::Entity);
			let values = values
				.iter()
				.map(|value| match loaded.get(value) {
					Some(referenced) if is_ref => Value::Object(referenced.to_dict()),
					_ => Value::from(value.as_str()),
				})
				.collect();

			properties.insert(name.clone(), Value::Array(values));
		}

		Ok(entity.to_dict_with(properties))
	}
}

impl EntityLoader for IndexLoader {
	fn datasets(&self) -> BoxFuture<'_, Result<Arc<Datasets>>> {
		self.datasets.datasets()
	}

	fn nested_dict<'a>(&'a self, entity: &'a Entity) -> BoxFuture<'a, Result<Map<String, Value>>> {
		Box::pin(self.expand(entity))
	}
}

impl ReconService {
	pub fn loader(&self) -> IndexLoader {
		IndexLoader::new(self.model.clone(), self.index.clone(), self.datasets.clone())
	}
}
