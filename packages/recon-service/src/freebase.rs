//! Reconciliation-protocol shapes used by spreadsheet clients such as OpenRefine.

use std::collections::BTreeMap;

use serde::Serialize;

use recon_config::Reconcile;
use recon_model::{Dataset, Entity, Model, Property, Schema};

use crate::{Error, Result, ScoredEntityResponse};

pub const PROTOCOL_VERSION: &str = "0.2";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseType {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
}
impl FreebaseType {
	pub fn from_schema(schema: &Schema) -> Self {
		let description = schema
			.description
			.clone()
			.filter(|description| !description.is_empty())
			.unwrap_or_else(|| schema.label.clone());

		Self {
			id: schema.name.clone(),
			name: schema.plural.clone(),
			description: Some(description),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseProperty {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
}
impl FreebaseProperty {
	pub fn from_prop(prop: &Property) -> Self {
		Self {
			id: prop.qname.clone(),
			name: prop.label.clone(),
			description: prop.description.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseEntity {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	#[serde(rename = "type")]
	pub type_: Vec<FreebaseType>,
}
impl FreebaseEntity {
	pub fn from_entity(entity: &Entity) -> Self {
		Self {
			id: entity.id.clone(),
			name: entity.caption.clone(),
			description: None,
			type_: vec![FreebaseType::from_schema(&entity.schema)],
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseScoredEntity {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	#[serde(rename = "type")]
	pub type_: Vec<FreebaseType>,
	pub score: Option<f64>,
	#[serde(rename = "match")]
	pub match_: Option<bool>,
}
impl FreebaseScoredEntity {
	/// Fails when the scored entity names a schema the model does not know, which means the index
	/// and the model have drifted apart.
	pub fn from_scored(model: &Model, scored: &ScoredEntityResponse) -> Result<Self> {
		let schema = model.get(&scored.schema).ok_or_else(|| Error::Model {
			message: format!("Missing schema: {}.", scored.schema),
		})?;

		Ok(Self {
			id: scored.id.clone(),
			name: scored.caption.clone(),
			description: None,
			type_: vec![FreebaseType::from_schema(&schema)],
			score: Some(scored.score),
			match_: Some(scored.match_),
		})
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseResponse {
	pub code: String,
	pub status: String,
}
impl Default for FreebaseResponse {
	fn default() -> Self {
		Self { code: "/api/status/ok".to_string(), status: "200 OK".to_string() }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseSuggestResponse<T> {
	#[serde(flatten)]
	pub response: FreebaseResponse,
	pub prefix: String,
	pub result: Vec<T>,
}
impl<T> FreebaseSuggestResponse<T> {
	pub fn new(prefix: impl Into<String>, result: Vec<T>) -> Self {
		Self { response: FreebaseResponse::default(), prefix: prefix.into(), result }
	}
}

pub type FreebaseTypeSuggestResponse = FreebaseSuggestResponse<FreebaseType>;
pub type FreebaseEntitySuggestResponse = FreebaseSuggestResponse<FreebaseEntity>;
pub type FreebasePropertySuggestResponse = FreebaseSuggestResponse<FreebaseProperty>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseManifestView {
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseManifestPreview {
	pub url: String,
	pub width: u32,
	pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseManifestSuggestType {
	pub service_url: String,
	pub service_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseManifestSuggest {
	pub entity: FreebaseManifestSuggestType,
	#[serde(rename = "type")]
	pub type_: FreebaseManifestSuggestType,
	pub property: FreebaseManifestSuggestType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreebaseManifest {
	pub versions: Vec<String>,
	pub name: String,
	pub identifier_space: String,
	pub schema_space: String,
	pub view: FreebaseManifestView,
	pub preview: FreebaseManifestPreview,
	pub suggest: FreebaseManifestSuggest,
	pub default_types: Vec<FreebaseType>,
}
impl FreebaseManifest {
	/// Service description for the reconciliation endpoint of `dataset`, served under `base_url`.
	pub fn build(cfg: &Reconcile, base_url: &str, dataset: &Dataset, model: &Model) -> Self {
		let base_url = base_url.trim_end_matches('/');
		let suggest = |kind: &str| FreebaseManifestSuggestType {
			service_url: base_url.to_string(),
			service_path: format!("/reconcile/{}/suggest/{kind}", dataset.name),
		};
		let default_types = model
			.schemata()
			.filter(|schema| schema.matchable && !schema.abstract_)
			.map(|schema| FreebaseType::from_schema(schema))
			.collect();

		Self {
			versions: vec![PROTOCOL_VERSION.to_string()],
			name: format!("{} ({})", cfg.title, dataset.title),
			identifier_space: cfg.identifier_space.clone(),
			schema_space: cfg.schema_space.clone(),
			view: FreebaseManifestView { url: cfg.view_url.clone() },
			preview: FreebaseManifestPreview {
				url: format!("{base_url}/entities/{{{{id}}}}"),
				width: cfg.preview_width,
				height: cfg.preview_height,
			},
			suggest: FreebaseManifestSuggest {
				entity: suggest("entity"),
				type_: suggest("type"),
				property: suggest("property"),
			},
			default_types,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreebaseEntityResult {
	pub result: Vec<FreebaseScoredEntity>,
}

pub type FreebaseQueryResult = BTreeMap<String, FreebaseEntityResult>;
