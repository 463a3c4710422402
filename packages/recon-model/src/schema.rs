use std::{
	collections::{BTreeMap, BTreeSet},
	fs,
	path::Path,
	sync::Arc,
};

use serde::Deserialize;

use crate::{Error, PropertyType, Result};

const DEFAULT_MODEL_JSON: &str = include_str!("../resources/model.json");

#[derive(Debug, Deserialize)]
struct ModelSpec {
	schemata: BTreeMap<String, SchemaSpec>,
}

#[derive(Debug, Deserialize)]
struct SchemaSpec {
	label: String,
	plural: String,
	description: Option<String>,
	#[serde(default, rename = "abstract")]
	abstract_: bool,
	#[serde(default)]
	matchable: bool,
	#[serde(default)]
	extends: Vec<String>,
	#[serde(default)]
	caption: Vec<String>,
	#[serde(default)]
	properties: BTreeMap<String, PropertySpec>,
}

#[derive(Debug, Deserialize)]
struct PropertySpec {
	label: String,
	#[serde(rename = "type")]
	type_: PropertyType,
	description: Option<String>,
	range: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
	pub name: String,
	/// `<DeclaringSchema>:<name>`.
	pub qname: String,
	pub label: String,
	pub description: Option<String>,
	pub type_: PropertyType,
	/// Target schema of entity references.
	pub range: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Schema {
	pub name: String,
	pub label: String,
	pub plural: String,
	pub description: Option<String>,
	pub abstract_: bool,
	pub matchable: bool,
	pub extends: Vec<String>,
	pub caption: Vec<String>,
	/// Own and inherited properties.
	pub properties: BTreeMap<String, Property>,
	pub ancestors: BTreeSet<String>,
	pub descendants: BTreeSet<String>,
}
impl Schema {
	pub fn get(&self, prop: &str) -> Option<&Property> {
		self.properties.get(prop)
	}
}

#[derive(Debug, Clone)]
pub struct Model {
	schemata: BTreeMap<String, Arc<Schema>>,
}
impl Model {
	pub fn default_model() -> Result<Self> {
		Self::from_json(DEFAULT_MODEL_JSON)
	}

	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadModel { path: path.to_path_buf(), source: err })?;

		Self::from_json(&raw)
	}

	/// Loads the model named by the config, falling back to the embedded one.
	pub fn from_config(cfg: &recon_config::Model) -> Result<Self> {
		match cfg.path.as_deref() {
			Some(path) => Self::load(path),
			None => Self::default_model(),
		}
	}

	pub fn from_json(raw: &str) -> Result<Self> {
		let spec: ModelSpec = serde_json::from_str(raw).map_err(Error::ParseModel)?;

		if spec.schemata.is_empty() {
			return Err(Error::InvalidModel { message: "model defines no schemata.".to_string() });
		}

		let mut resolved = BTreeMap::new();

		for name in spec.schemata.keys() {
			resolve(name, &spec.schemata, &mut Vec::new(), &mut resolved)?;
		}

		let mut descendants: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

		for (name, schema) in &resolved {
			for ancestor in &schema.ancestors {
				descendants.entry(ancestor.clone()).or_default().insert(name.clone());
			}
		}

		let schemata = resolved
			.into_iter()
			.map(|(name, mut schema)| {
				schema.descendants = descendants.remove(&name).unwrap_or_default();

				(name, Arc::new(schema))
			})
			.collect();

		Ok(Self { schemata })
	}

	pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
		self.schemata.get(name).cloned()
	}

	pub fn schemata(&self) -> impl Iterator<Item = &Arc<Schema>> {
		self.schemata.values()
	}

	pub fn matchable_descendants(&self, schema: &Schema) -> BTreeSet<String> {
		schema
			.descendants
			.iter()
			.filter(|name| self.schemata.get(name.as_str()).map(|s| s.matchable).unwrap_or(false))
			.cloned()
			.collect()
	}
}

fn resolve(
	name: &str,
	specs: &BTreeMap<String, SchemaSpec>,
	visiting: &mut Vec<String>,
	resolved: &mut BTreeMap<String, Schema>,
) -> Result<()> {
	if resolved.contains_key(name) {
		return Ok(());
	}
	if visiting.iter().any(|seen| seen == name) {
		return Err(Error::InvalidModel {
			message: format!("schema {name} inherits from itself."),
		});
	}

	let spec = specs.get(name).ok_or_else(|| {
		let child = visiting.last().map(String::as_str).unwrap_or("?");

		Error::InvalidModel { message: format!("schema {child} extends unknown schema {name}.") }
	})?;

	visiting.push(name.to_string());

	let mut ancestors = BTreeSet::new();
	let mut properties = BTreeMap::new();
	let mut caption = spec.caption.clone();

	for parent in &spec.extends {
		resolve(parent, specs, visiting, resolved)?;

		let Some(parent_schema) = resolved.get(parent) else { continue };

		ancestors.insert(parent.clone());
		ancestors.extend(parent_schema.ancestors.iter().cloned());

		for (prop_name, prop) in &parent_schema.properties {
			properties.entry(prop_name.clone()).or_insert_with(|| prop.clone());
		}

		if caption.is_empty() {
			caption = parent_schema.caption.clone();
		}
	}

	visiting.pop();

	for (prop_name, prop) in &spec.properties {
		properties.insert(
			prop_name.clone(),
			Property {
				name: prop_name.clone(),
				qname: format!("{name}:{prop_name}"),
				label: prop.label.clone(),
				description: prop.description.clone(),
				type_: prop.type_,
				range: prop.range.clone(),
			},
		);
	}

	resolved.insert(
		name.to_string(),
		Schema {
			name: name.to_string(),
			label: spec.label.clone(),
			plural: spec.plural.clone(),
			description: spec.description.clone(),
			abstract_: spec.abstract_,
			matchable: spec.matchable,
			extends: spec.extends.clone(),
			caption,
			properties,
			ancestors,
			descendants: BTreeSet::new(),
		},
	);

	Ok(())
}
