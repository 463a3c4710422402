use recon_service::{ReconService, SearchRequest};
use recon_testkit::{StubIndex, StubReply, StubResponses, TEST_INDEX, hit, search_response};

async fn start(responses: StubResponses) -> (StubIndex, ReconService) {
	let stub = StubIndex::start(TEST_INDEX, responses).await.expect("Failed to start stub index.");
	let service = ReconService::from_config(recon_testkit::test_config(stub.url()))
		.expect("Failed to build service.");

	(stub, service)
}

#[tokio::test]
async fn search_round_trips_through_http_client() {
	let body = search_response(
		vec![hit(
			"V-1",
			4.0,
			serde_json::json!({
				"schema": "Vessel",
				"properties": { "name": ["Ocean Star"], "flag": ["pa"] },
				"datasets": ["us_ofac_sdn"]
			}),
		)],
		Some(1),
	);
	let (stub, service) = start(StubResponses::new(TEST_INDEX).with_search(body)).await;
	let response = service
		.search(SearchRequest {
			dataset: "us_ofac_sdn".to_string(),
			query: "ocean".to_string(),
			..Default::default()
		})
		.await
		.expect("Search failed.");

	assert_eq!(response.results.len(), 1);
	assert_eq!(response.results[0]["caption"], "Ocean Star");
	assert_eq!(response.results[0]["datasets"], serde_json::json!(["us_ofac_sdn"]));

	let bodies = stub.search_bodies();

	assert_eq!(bodies.len(), 1);
	assert_eq!(bodies[0]["size"], 10);
	assert_eq!(bodies[0]["from"], 0);
	assert!(bodies[0]["aggs"].get("datasets").is_some());
}

#[tokio::test]
async fn health_and_stats_use_cluster_endpoints() {
	let (stub, service) = start(StubResponses::new(TEST_INDEX)).await;

	assert!(service.get_index_status().await.expect("Probe failed."));
	assert!(service.get_index_stats().await.expect("Stats failed.").is_some());

	let paths: Vec<String> = stub.requests().into_iter().map(|request| request.path).collect();

	assert_eq!(
		paths,
		vec![format!("/_cluster/health/{TEST_INDEX}"), format!("/{TEST_INDEX}/_stats")]
	);
}

#[tokio::test]
async fn failing_cluster_is_unhealthy() {
	let responses = StubResponses::new(TEST_INDEX)
		.with_health(StubReply::status(500, serde_json::json!({ "error": "boom" })));
	let (_stub, service) = start(responses).await;

	assert!(!service.get_index_status().await.expect("Transport errors must not propagate."));
}

#[tokio::test]
async fn red_cluster_is_unhealthy() {
	let responses = StubResponses::new(TEST_INDEX)
		.with_health(StubReply::ok(serde_json::json!({ "status": "red" })));
	let (_stub, service) = start(responses).await;

	assert!(!service.get_index_status().await.expect("Probe failed."));
}

#[tokio::test]
async fn search_errors_propagate() {
	let stub = StubIndex::start(TEST_INDEX, StubResponses::new(TEST_INDEX))
		.await
		.expect("Failed to start stub index.");
	let mut cfg = recon_testkit::test_config(stub.url());

	cfg.index.name = "missing-index".to_string();

	let service = ReconService::from_config(cfg).expect("Failed to build service.");
	let err = service
		.search(SearchRequest { dataset: "eu_fsf".to_string(), ..Default::default() })
		.await
		.expect_err("Unknown index path must fail.");

	assert!(matches!(err, recon_service::Error::Index { .. }));
}

#[tokio::test]
async fn nested_search_loads_references_with_second_request() {
	let ownership = hit(
		"OWN-1",
		2.0,
		serde_json::json!({
			"schema": "Ownership",
			"properties": { "owner": ["P-1"], "role": ["director"] },
			"datasets": ["eu_fsf"]
		}),
	);
	let owner = hit(
		"P-1",
		1.0,
		serde_json::json!({
			"schema": "Person",
			"properties": { "name": ["Ivan Petrov"] },
			"datasets": ["eu_fsf"]
		}),
	);
	let (stub, service) = start(StubResponses::new(TEST_INDEX)).await;

	stub.queue_search(search_response(vec![ownership], Some(1)));
	stub.queue_search(search_response(vec![owner], Some(1)));

	let response = service
		.search(SearchRequest {
			dataset: "eu_fsf".to_string(),
			nested: true,
			..Default::default()
		})
		.await
		.expect("Search failed.");

	assert_eq!(response.results[0]["properties"]["owner"][0]["caption"], "Ivan Petrov");
	assert_eq!(response.results[0]["properties"]["role"], serde_json::json!(["director"]));

	let bodies = stub.search_bodies();

	assert_eq!(bodies.len(), 2);
	assert_eq!(bodies[1]["query"], serde_json::json!({ "ids": { "values": ["P-1"] } }));
	assert_eq!(bodies[1]["size"], 1);
}

#[test]
fn unknown_scoring_algorithm_is_a_model_error() {
	let mut cfg = recon_testkit::test_config("http://127.0.0.1:9");

	cfg.scoring.algorithm = "logic-v2".to_string();

	let err = ReconService::from_config(cfg).err().expect("Unknown algorithm must fail.");

	assert!(matches!(err, recon_service::Error::Model { message } if message.contains("logic-v2")));
}
