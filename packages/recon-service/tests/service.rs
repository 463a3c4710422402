use std::{
	collections::{BTreeMap, VecDeque},
	sync::{Arc, Mutex},
};

use serde_json::Value;

use recon_index::SearchBody;
use recon_model::Model;
use recon_service::{
	BoxFuture, Error, MatchParams, MatchRequest, NameOverlap, ReconService, SearchIndex,
	SearchRequest, StaticDatasets,
};
use recon_testkit::{TEST_INDEX, hit, search_response, test_config};

enum Health {
	Status(&'static str),
	Unreachable,
	Garbled,
}

/// Answers searches from a queue and records every search body.
struct FakeIndex {
	searches: Mutex<VecDeque<Value>>,
	bodies: Mutex<Vec<Value>>,
	stats: Value,
	health: Health,
}
impl FakeIndex {
	fn new() -> Self {
		Self {
			searches: Mutex::new(VecDeque::new()),
			bodies: Mutex::new(Vec::new()),
			stats: serde_json::json!({ "indices": {} }),
			health: Health::Status("green"),
		}
	}

	fn with_health(mut self, health: Health) -> Self {
		self.health = health;

		self
	}

	fn with_stats(mut self, stats: Value) -> Self {
		self.stats = stats;

		self
	}

	fn queue(&self, resp: Value) {
		self.searches.lock().expect("lock").push_back(resp);
	}

	fn bodies(&self) -> Vec<Value> {
		self.bodies.lock().expect("lock").clone()
	}
}
impl SearchIndex for FakeIndex {
	fn index_name(&self) -> &str {
		TEST_INDEX
	}

	fn search<'a>(&'a self, body: &'a SearchBody) -> BoxFuture<'a, recon_index::Result<Value>> {
		self.bodies.lock().expect("lock").push(serde_json::to_value(body).expect("serialize"));

		let resp = self
			.searches
			.lock()
			.expect("lock")
			.pop_front()
			.unwrap_or_else(|| search_response(Vec::new(), Some(0)));

		Box::pin(async move { Ok(resp) })
	}

	fn stats(&self) -> BoxFuture<'_, recon_index::Result<Value>> {
		let stats = self.stats.clone();

		Box::pin(async move { Ok(stats) })
	}

	fn cluster_health(&self) -> BoxFuture<'_, recon_index::Result<Value>> {
		let result = match self.health {
			Health::Status(status) => Ok(serde_json::json!({ "status": status })),
			Health::Unreachable => {
				Err(recon_index::Error::Status { status: 503, body: "unavailable".to_string() })
			},
			Health::Garbled => Err(recon_index::Error::InvalidResponse {
				message: "Index response is not valid JSON.".to_string(),
			}),
		};

		Box::pin(async move { result })
	}
}

fn service(index: Arc<FakeIndex>) -> ReconService {
	let cfg = test_config("http://127.0.0.1:9");
	let datasets = StaticDatasets::from_config(&cfg).expect("Failed to build datasets.");
	let model = Model::default_model().expect("Failed to load model.");

	ReconService::new(cfg, Arc::new(model), index, Arc::new(datasets), Arc::new(NameOverlap))
}

fn person(id: &str, score: f64, name: &str) -> Value {
	hit(
		id,
		score,
		serde_json::json!({
			"schema": "Person",
			"properties": { "name": [name], "country": ["ru"] },
			"datasets": ["eu_fsf"]
		}),
	)
}

fn match_request(raw: Value) -> MatchRequest {
	serde_json::from_value(raw).expect("Invalid match request.")
}

#[tokio::test]
async fn health_follows_cluster_status() {
	for (status, healthy) in [("green", true), ("yellow", true), ("red", false), ("", false)] {
		let service = service(Arc::new(FakeIndex::new().with_health(Health::Status(status))));

		assert_eq!(service.get_index_status().await.expect("Probe failed."), healthy, "{status}");
	}
}

#[tokio::test]
async fn unreachable_index_is_unhealthy() {
	let service = service(Arc::new(FakeIndex::new().with_health(Health::Unreachable)));

	assert!(!service.get_index_status().await.expect("Transport errors must not propagate."));
}

#[tokio::test]
async fn undecodable_health_propagates() {
	let service = service(Arc::new(FakeIndex::new().with_health(Health::Garbled)));

	assert!(matches!(service.get_index_status().await, Err(Error::Index { .. })));
}

#[tokio::test]
async fn index_stats_select_configured_index() {
	let stats = serde_json::json!({
		"indices": {
			"other": { "primaries": { "docs": { "count": 1 } } },
			TEST_INDEX: { "primaries": { "docs": { "count": 42 } } }
		}
	});
	let populated = service(Arc::new(FakeIndex::new().with_stats(stats)));
	let empty = service(Arc::new(FakeIndex::new()));
	let selected =
		populated.get_index_stats().await.expect("Stats failed.").expect("Missing index.");

	assert_eq!(selected["primaries"]["docs"]["count"], 42);
	assert!(empty.get_index_stats().await.expect("Stats failed.").is_none());
}

#[tokio::test]
async fn search_builds_paged_faceted_query() {
	let index = Arc::new(FakeIndex::new());
	let mut resp = search_response(
		vec![person("P1", 3.5, "Ivan Petrov"), hit("GONE", 1.0, Value::Null)],
		Some(17),
	);

	resp["hits"]["hits"][1].as_object_mut().expect("hit").remove("_source");
	resp["aggregations"] = serde_json::json!({
		"countries": { "buckets": [{ "key": "ru", "doc_count": 17 }] },
		"datasets": { "buckets": [{ "key": "eu_fsf", "doc_count": 17 }] }
	});
	index.queue(resp);

	let service = service(index.clone());
	let mut filters = BTreeMap::new();

	filters.insert("countries".to_string(), vec!["ru".to_string()]);

	let response = service
		.search(SearchRequest {
			dataset: "sanctions".to_string(),
			query: "petrov".to_string(),
			schema: Some("Person".to_string()),
			filters,
			limit: Some(5),
			offset: 10,
			fuzzy: true,
			nested: false,
		})
		.await
		.expect("Search failed.");

	assert_eq!(response.total, Some(17));
	assert_eq!(response.limit, 5);
	assert_eq!(response.offset, Some(10));
	assert_eq!(response.results.len(), 1);
	assert_eq!(response.results[0]["id"], "P1");
	assert_eq!(response.results[0]["score"], 3.5);
	assert_eq!(response.facets["datasets"].label, "Data sources");
	assert_eq!(response.facets["datasets"].values[0].label, "EU Financial Sanctions Files");

	let bodies = index.bodies();
	let body = &bodies[0];

	assert_eq!(body["size"], 5);
	assert_eq!(body["from"], 10);
	assert_eq!(body["aggs"]["countries"]["terms"]["size"], 1000);
	assert_eq!(
		body["query"]["bool"]["filter"][0],
		serde_json::json!({ "terms": { "datasets": ["eu_fsf", "us_ofac_sdn"] } })
	);
	assert!(
		body["query"]["bool"]["filter"]
			.as_array()
			.expect("filters")
			.contains(&serde_json::json!({ "terms": { "countries": ["ru"] } }))
	);
	assert_eq!(body["query"]["bool"]["should"][0]["query_string"]["fuzziness"], 2);
}

#[tokio::test]
async fn search_tolerates_missing_total() {
	let index = Arc::new(FakeIndex::new());

	index.queue(search_response(vec![person("P1", 1.0, "Ivan Petrov")], None));

	let response = service(index)
		.search(SearchRequest { dataset: "eu_fsf".to_string(), ..Default::default() })
		.await
		.expect("Search failed.");

	assert_eq!(response.total, None);
	assert_eq!(response.limit, 10);
	assert!(response.facets.is_empty());
}

#[tokio::test]
async fn search_clamps_limit() {
	let index = Arc::new(FakeIndex::new());
	let response = service(index.clone())
		.search(SearchRequest {
			dataset: "eu_fsf".to_string(),
			limit: Some(5_000),
			..Default::default()
		})
		.await
		.expect("Search failed.");

	assert_eq!(response.limit, 50);
	assert_eq!(index.bodies()[0]["size"], 50);
}

#[tokio::test]
async fn search_rejects_bad_requests() {
	let service = service(Arc::new(FakeIndex::new()));
	let unknown_dataset = service
		.search(SearchRequest { dataset: "nope".to_string(), ..Default::default() })
		.await;
	let unknown_schema = service
		.search(SearchRequest {
			dataset: "eu_fsf".to_string(),
			schema: Some("Spaceship".to_string()),
			..Default::default()
		})
		.await;
	let too_deep = service
		.search(SearchRequest {
			dataset: "eu_fsf".to_string(),
			offset: 9_995,
			limit: Some(10),
			..Default::default()
		})
		.await;

	assert!(matches!(unknown_dataset, Err(Error::NotFound { .. })));
	assert!(matches!(unknown_schema, Err(Error::InvalidRequest { .. })));
	assert!(matches!(too_deep, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn nested_search_inlines_referenced_entities() {
	let index = Arc::new(FakeIndex::new());
	let ownership = hit(
		"OWN-1",
		2.0,
		serde_json::json!({
			"schema": "Ownership",
			"properties": { "owner": ["P1"], "asset": ["MISSING"], "role": ["shareholder"] },
			"datasets": ["eu_fsf"]
		}),
	);

	index.queue(search_response(vec![ownership], Some(1)));
	index.queue(search_response(vec![person("P1", 1.0, "Ivan Petrov")], Some(1)));

	let response = service(index.clone())
		.search(SearchRequest {
			dataset: "eu_fsf".to_string(),
			nested: true,
			..Default::default()
		})
		.await
		.expect("Search failed.");
	let props = &response.results[0]["properties"];

	assert_eq!(props["owner"][0]["id"], "P1");
	assert_eq!(props["owner"][0]["caption"], "Ivan Petrov");
	assert_eq!(props["asset"][0], "MISSING");
	assert_eq!(props["role"][0], "shareholder");
	assert_eq!(response.results[0]["score"], 2.0);

	let bodies = index.bodies();

	assert_eq!(bodies.len(), 2);
	assert_eq!(bodies[1]["query"], serde_json::json!({ "ids": { "values": ["MISSING", "P1"] } }));
}

#[tokio::test]
async fn query_entities_skip_malformed_hits() {
	let index = Arc::new(FakeIndex::new());
	let mut resp =
		search_response(vec![person("A", 2.0, "Anna"), person("B", 1.0, "Boris")], Some(2));

	resp["hits"]["hits"][0].as_object_mut().expect("hit").remove("_source");
	index.queue(resp);

	let entities: Vec<(String, f64)> = service(index.clone())
		.query_entities(serde_json::json!({ "match_all": {} }), 7)
		.await
		.expect("Query failed.")
		.map(|(entity, score)| (entity.id, score))
		.collect();

	assert_eq!(entities, vec![("B".to_string(), 1.0)]);
	assert_eq!(index.bodies()[0], serde_json::json!({ "query": { "match_all": {} }, "size": 7 }));
}

#[tokio::test]
async fn match_scores_and_orders_candidates() {
	let index = Arc::new(FakeIndex::new());

	index.queue(search_response(
		vec![
			person("weak", 9.0, "Ivan Sidorov"),
			person("exact", 1.0, "Ivan Petrov"),
			person("none", 5.0, "Maria Lopez"),
		],
		Some(3),
	));

	let service = service(index.clone());
	let request = match_request(serde_json::json!({
		"queries": {
			"q1": { "schema": "Person", "properties": { "name": "Ivan Petrov" } }
		}
	}));
	let response = service
		.match_entities("sanctions", request, MatchParams { limit: Some(2), ..Default::default() })
		.await
		.expect("Match failed.");
	let matches = &response.responses["q1"];
	let ids: Vec<&str> = matches.results.iter().map(|result| result.id.as_str()).collect();

	assert_eq!(matches.status, 200);
	assert_eq!(ids, vec!["exact", "weak"]);
	assert_eq!(matches.total, 2);
	assert!(matches.results[0].match_);
	assert!(!matches.results[1].match_);
	assert_eq!(matches.query["schema"], "Person");
	assert_eq!(index.bodies()[0]["size"], 6, "limit times match_candidates");

	let freebase = response.to_freebase(&service.model).expect("Known schemata.");

	assert_eq!(freebase["q1"].result[0].id, "exact");
	assert_eq!(freebase["q1"].result[0].match_, Some(true));
}

#[tokio::test]
async fn match_rejects_bad_requests() {
	let service = service(Arc::new(FakeIndex::new()));
	let unknown_property = service
		.match_entities(
			"eu_fsf",
			match_request(serde_json::json!({
				"queries": { "q": { "schema": "Person", "properties": { "wingspan": "1m" } } }
			})),
			MatchParams::default(),
		)
		.await;
	let not_matchable = service
		.match_entities(
			"eu_fsf",
			match_request(serde_json::json!({
				"queries": { "q": { "schema": "Address", "properties": { "full": "Main St" } } }
			})),
			MatchParams::default(),
		)
		.await;
	let empty = service
		.match_entities(
			"eu_fsf",
			match_request(serde_json::json!({ "queries": {} })),
			MatchParams::default(),
		)
		.await;
	let bad_threshold = service
		.match_entities(
			"eu_fsf",
			match_request(serde_json::json!({
				"queries": { "q": { "schema": "Person", "properties": { "name": "X" } } }
			})),
			MatchParams { threshold: Some(1.5), ..Default::default() },
		)
		.await;
	let unknown_dataset = service
		.match_entities(
			"nope",
			match_request(serde_json::json!({ "queries": {} })),
			MatchParams::default(),
		)
		.await;

	assert!(matches!(unknown_property, Err(Error::InvalidRequest { .. })));
	assert!(matches!(not_matchable, Err(Error::InvalidRequest { .. })));
	assert!(matches!(empty, Err(Error::InvalidRequest { .. })));
	assert!(matches!(bad_threshold, Err(Error::InvalidRequest { .. })));
	assert!(matches!(unknown_dataset, Err(Error::NotFound { .. })));
}
