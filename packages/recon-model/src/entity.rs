use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Datasets, Error, Model, Property, PropertyType, Result, Schema};

/// Identifier given to entities built from an API example without one.
pub const EXAMPLE_ID: &str = "query";

/// An entity submitted for matching, as it arrives over the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExample {
	#[serde(default)]
	pub id: Option<String>,
	pub schema: String,
	#[serde(default)]
	pub properties: BTreeMap<String, ExampleValues>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExampleValues {
	One(String),
	Many(Vec<String>),
}
impl ExampleValues {
	fn into_vec(self) -> Vec<String> {
		match self {
			Self::One(value) => vec![value],
			Self::Many(values) => values,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Entity {
	pub id: String,
	pub schema: Arc<Schema>,
	pub caption: String,
	pub properties: BTreeMap<String, Vec<String>>,
	pub datasets: Vec<String>,
	pub referents: Vec<String>,
	pub target: bool,
	pub first_seen: Option<String>,
	pub last_seen: Option<String>,
}
impl Entity {
	/// Builds an entity from an index document. Properties unknown to the schema and datasets
	/// missing from the registry are dropped.
	pub fn from_data(
		source: &Map<String, Value>,
		model: &Model,
		datasets: &Datasets,
	) -> Result<Self> {
		let id = source
			.get("id")
			.and_then(Value::as_str)
			.filter(|id| !id.is_empty())
			.ok_or_else(|| Error::InvalidEntity { message: "document has no id.".to_string() })?;
		let schema_name = source.get("schema").and_then(Value::as_str).ok_or_else(|| {
			Error::InvalidEntity { message: format!("document {id} has no schema.") }
		})?;
		let schema =
			model.get(schema_name).ok_or_else(|| Error::UnknownSchema(schema_name.to_string()))?;
		let mut properties = BTreeMap::new();

		if let Some(raw) = source.get("properties").and_then(Value::as_object) {
			for (name, values) in raw {
				if schema.get(name).is_none() {
					continue;
				}

				let values = string_list(values);

				if !values.is_empty() {
					properties.insert(name.clone(), values);
				}
			}
		}

		let entity_datasets = string_list(source.get("datasets").unwrap_or(&Value::Null))
			.into_iter()
			.filter(|name| datasets.contains(name))
			.collect();
		let caption = source
			.get("caption")
			.and_then(Value::as_str)
			.filter(|caption| !caption.trim().is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| default_caption(&schema, &properties));

		Ok(Self {
			id: id.to_string(),
			schema,
			caption,
			properties,
			datasets: entity_datasets,
			referents: string_list(source.get("referents").unwrap_or(&Value::Null)),
			target: source.get("target").and_then(Value::as_bool).unwrap_or(false),
			first_seen: source.get("first_seen").and_then(Value::as_str).map(str::to_string),
			last_seen: source.get("last_seen").and_then(Value::as_str).map(str::to_string),
		})
	}

	/// Builds a query entity. Unknown schemata and properties are rejected.
	pub fn from_example(model: &Model, example: EntityExample) -> Result<Self> {
		let schema =
			model.get(&example.schema).ok_or_else(|| Error::UnknownSchema(example.schema.clone()))?;
		let mut properties = BTreeMap::new();

		for (name, values) in example.properties {
			if schema.get(&name).is_none() {
				return Err(Error::UnknownProperty { schema: schema.name.clone(), property: name });
			}

			let values: Vec<String> = values
				.into_vec()
				.into_iter()
				.map(|value| value.trim().to_string())
				.filter(|value| !value.is_empty())
				.collect();

			if !values.is_empty() {
				properties.insert(name, values);
			}
		}

		let caption = default_caption(&schema, &properties);

		Ok(Self {
			id: example.id.unwrap_or_else(|| EXAMPLE_ID.to_string()),
			schema,
			caption,
			properties,
			datasets: Vec::new(),
			referents: Vec::new(),
			target: false,
			first_seen: None,
			last_seen: None,
		})
	}

	pub fn get(&self, prop: &str) -> &[String] {
		self.properties.get(prop).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Every `(property, value)` pair, in property order.
	pub fn itervalues(&self) -> impl Iterator<Item = (&Property, &str)> {
		self.properties
			.iter()
			.filter_map(|(name, values)| self.schema.get(name).map(|prop| (prop, values)))
			.flat_map(|(prop, values)| values.iter().map(move |value| (prop, value.as_str())))
	}

	/// Values of all properties of the given type.
	pub fn get_type_values(&self, type_: PropertyType) -> Vec<&str> {
		self.itervalues().filter(|(prop, _)| prop.type_ == type_).map(|(_, value)| value).collect()
	}

	pub fn to_dict(&self) -> Map<String, Value> {
		let properties = self
			.properties
			.iter()
			.map(|(name, values)| (name.clone(), Value::from(values.clone())))
			.collect();

		self.to_dict_with(properties)
	}

	/// Same shape as [`Entity::to_dict`] with caller-supplied property values.
	pub fn to_dict_with(&self, properties: Map<String, Value>) -> Map<String, Value> {
		let mut data = Map::new();

		data.insert("id".to_string(), Value::from(self.id.clone()));
		data.insert("caption".to_string(), Value::from(self.caption.clone()));
		data.insert("schema".to_string(), Value::from(self.schema.name.clone()));
		data.insert("properties".to_string(), Value::Object(properties));
		data.insert("datasets".to_string(), Value::from(self.datasets.clone()));
		data.insert("referents".to_string(), Value::from(self.referents.clone()));
		data.insert("target".to_string(), Value::Bool(self.target));
		data.insert("first_seen".to_string(), Value::from(self.first_seen.clone()));
		data.insert("last_seen".to_string(), Value::from(self.last_seen.clone()));

		data
	}
}

fn default_caption(schema: &Schema, properties: &BTreeMap<String, Vec<String>>) -> String {
	schema
		.caption
		.iter()
		.find_map(|prop| properties.get(prop).and_then(|values| values.first()))
		.cloned()
		.unwrap_or_else(|| schema.label.clone())
}

fn string_list(value: &Value) -> Vec<String> {
	let scalar = |value: &Value| match value {
		Value::String(text) if !text.is_empty() => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	};

	match value {
		Value::Array(items) => items.iter().filter_map(scalar).collect(),
		other => scalar(other).into_iter().collect(),
	}
}
