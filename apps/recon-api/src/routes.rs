use std::collections::BTreeMap;

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use recon_service::{
	Error as ServiceError, FreebaseQueryResult, MatchParams, MatchRequest, MatchResponse,
	SearchRequest, SearchResponse,
};

use crate::state::AppState;

/// Query parameters accepted as repeatable search filters.
pub const FILTER_FIELDS: [&str; 3] = ["countries", "topics", "datasets"];

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/healthz", get(health))
		.route("/readyz", get(ready))
		.route("/search/{dataset}", get(search))
		.route("/match/{dataset}", post(match_entities))
		.route("/reconcile/{dataset}", post(reconcile))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/index_stats", get(index_stats)).with_state(state)
}

#[derive(Debug, Serialize)]
struct StatusBody {
	status: &'static str,
}

#[derive(Debug, Deserialize)]
struct MatchQuery {
	limit: Option<usize>,
	threshold: Option<f64>,
	cutoff: Option<f64>,
	#[serde(default)]
	fuzzy: bool,
}
impl From<MatchQuery> for MatchParams {
	fn from(query: MatchQuery) -> Self {
		Self {
			limit: query.limit,
			threshold: query.threshold,
			cutoff: query.cutoff,
			fuzzy: query.fuzzy,
		}
	}
}

async fn health() -> Json<StatusBody> {
	Json(StatusBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> Result<Response, ApiError> {
	if state.service.get_index_status().await? {
		Ok(Json(StatusBody { status: "ok" }).into_response())
	} else {
		Ok((StatusCode::SERVICE_UNAVAILABLE, Json(StatusBody { status: "unavailable" }))
			.into_response())
	}
}

async fn search(
	State(state): State<AppState>,
	Path(dataset): Path<String>,
	Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, ApiError> {
	let request = search_request(dataset, params)?;
	let response = state.service.search(request).await?;

	Ok(Json(response))
}

async fn match_entities(
	State(state): State<AppState>,
	Path(dataset): Path<String>,
	Query(query): Query<MatchQuery>,
	Json(payload): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
	let response = state.service.match_entities(&dataset, payload, query.into()).await?;

	Ok(Json(response))
}

async fn reconcile(
	State(state): State<AppState>,
	Path(dataset): Path<String>,
	Query(query): Query<MatchQuery>,
	Json(payload): Json<MatchRequest>,
) -> Result<Json<FreebaseQueryResult>, ApiError> {
	let response = state.service.match_entities(&dataset, payload, query.into()).await?;

	Ok(Json(response.to_freebase(&state.service.model)?))
}

async fn index_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	match state.service.get_index_stats().await? {
		Some(stats) => Ok(Json(stats)),
		None => Err(json_error(
			StatusCode::NOT_FOUND,
			"NOT_FOUND",
			format!("Index {} has no statistics.", state.service.index.index_name()),
			None,
		)),
	}
}

fn search_request(
	dataset: String,
	params: Vec<(String, String)>,
) -> Result<SearchRequest, ApiError> {
	let mut request = SearchRequest { dataset, ..Default::default() };
	let mut filters: BTreeMap<String, Vec<String>> = BTreeMap::new();

	for (key, value) in params {
		match key.as_str() {
			"q" => request.query = value,
			"schema" => request.schema = Some(value),
			"limit" => request.limit = Some(parse_param(&key, &value)?),
			"offset" => request.offset = parse_param(&key, &value)?,
			"fuzzy" => request.fuzzy = parse_flag(&key, &value)?,
			"nested" => request.nested = parse_flag(&key, &value)?,
			field if FILTER_FIELDS.contains(&field) => {
				filters.entry(field.to_string()).or_default().push(value);
			},
			_ => {},
		}
	}

	request.filters = filters;

	Ok(request)
}

fn parse_param(key: &str, value: &str) -> Result<usize, ApiError> {
	value.trim().parse().map_err(|_| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{key} must be a non-negative integer."),
			Some(vec![key.to_string()]),
		)
	})
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ApiError> {
	match value.trim() {
		"true" | "1" => Ok(true),
		"false" | "0" | "" => Ok(false),
		_ => Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{key} must be true or false."),
			Some(vec![key.to_string()]),
		)),
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None)
			},
			ServiceError::NotFound { message } => {
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None)
			},
			ServiceError::Index { message } => {
				tracing::error!(error = %message, "Index request failed.");

				json_error(StatusCode::BAD_GATEWAY, "INDEX_ERROR", message, None)
			},
			ServiceError::Model { message } => {
				tracing::error!(error = %message, "Model mismatch.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "MODEL_ERROR", message, None)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
