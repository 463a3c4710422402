//! Builders for the boolean query documents sent to the index.
//!
//! Every builder is pure: the same inputs always produce the same document.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use recon_model::{Dataset, Entity, Model, PropertyType, Schema};

/// Upper bound on buckets returned per facet.
pub const FACET_SIZE: usize = 1_000;

const NAME_SLOP: u32 = 3;
const NAME_BOOST: f64 = 3.0;
const FUZZY_EDITS: u32 = 2;

/// Wraps `shoulds` in a filtered boolean query that requires at least one of them to match.
pub fn filter_query(
	model: &Model,
	shoulds: Vec<Value>,
	dataset: &Dataset,
	schema: Option<&Schema>,
	filters: &BTreeMap<String, Vec<String>>,
) -> Value {
	let mut filterqs = vec![serde_json::json!({ "terms": { "datasets": dataset.source_names() } })];

	if let Some(schema) = schema {
		let names = filter_schemata(model, schema);

		filterqs.push(serde_json::json!({ "terms": { "schema": names } }));
	}

	for (field, values) in filters {
		let values: Vec<&str> =
			values.iter().map(String::as_str).filter(|value| !value.is_empty()).collect();

		if values.is_empty() {
			continue;
		}

		filterqs.push(serde_json::json!({ "terms": { field.as_str(): values } }));
	}

	serde_json::json!({
		"bool": {
			"filter": filterqs,
			"should": shoulds,
			"minimum_should_match": 1
		}
	})
}

/// Schema names a query for `schema` may return.
pub fn filter_schemata(model: &Model, schema: &Schema) -> Vec<String> {
	let mut names: BTreeSet<String> = if schema.matchable {
		model.matchable_descendants(schema)
	} else {
		schema.descendants.clone()
	};

	names.insert(schema.name.clone());

	names.into_iter().collect()
}

/// Query for candidates resembling `entity`.
///
/// `fuzzy` is part of the interface for parity with [`text_query`] but does not change the
/// document: names are already matched with slop.
pub fn entity_query(model: &Model, dataset: &Dataset, entity: &Entity, _fuzzy: bool) -> Value {
	let mut terms: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
	let mut texts = Vec::new();
	let mut shoulds = Vec::new();

	for (prop, value) in entity.itervalues() {
		if prop.type_ == PropertyType::Name {
			shoulds.push(serde_json::json!({
				"match_phrase": {
					"names": { "query": value, "slop": NAME_SLOP, "boost": NAME_BOOST }
				}
			}));
		}

		if let Some(group) = prop.type_.group()
			&& !prop.type_.is_text()
		{
			terms.entry(group).or_default().push(value);
		}

		texts.push(value);
	}

	for (field, values) in terms {
		shoulds.push(serde_json::json!({ "terms": { field: values } }));
	}
	for text in texts {
		shoulds.push(serde_json::json!({ "match_phrase": { "text": text } }));
	}

	filter_query(model, shoulds, dataset, Some(entity.schema.as_ref()), &BTreeMap::new())
}

/// Free-text query over names and full text. A blank query matches everything in scope.
pub fn text_query(
	model: &Model,
	dataset: &Dataset,
	query: &str,
	schema: Option<&Schema>,
	filters: &BTreeMap<String, Vec<String>>,
	fuzzy: bool,
) -> Value {
	let should = if query.trim().is_empty() {
		serde_json::json!({ "match_all": {} })
	} else {
		serde_json::json!({
			"query_string": {
				"query": query,
				"fields": ["names^3", "text"],
				"default_operator": "and",
				"fuzziness": if fuzzy { FUZZY_EDITS } else { 0 },
				"lenient": fuzzy
			}
		})
	};

	filter_query(model, vec![should], dataset, schema, filters)
}

/// One terms aggregation per field.
pub fn facet_aggregations(fields: &[String]) -> Map<String, Value> {
	fields
		.iter()
		.map(|field| {
			(
				field.clone(),
				serde_json::json!({ "terms": { "field": field, "size": FACET_SIZE } }),
			)
		})
		.collect()
}
