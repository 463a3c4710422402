use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use recon_model::{Entity, EntityExample, Model};

use crate::{
	Error, FreebaseEntityResult, FreebaseQueryResult, FreebaseScoredEntity, ReconService, Result,
	ScoredEntityResponse, query, scoring,
};

#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
	pub queries: BTreeMap<String, EntityExample>,
}

/// Per-request overrides of the configured scoring settings.
#[derive(Debug, Clone, Default)]
pub struct MatchParams {
	pub limit: Option<usize>,
	pub threshold: Option<f64>,
	pub cutoff: Option<f64>,
	pub fuzzy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityMatches {
	pub status: u16,
	pub results: Vec<ScoredEntityResponse>,
	pub total: usize,
	pub query: Map<String, Value>,
}
impl EntityMatches {
	pub fn to_freebase(&self, model: &Model) -> Result<FreebaseEntityResult> {
		let result = self
			.results
			.iter()
			.map(|scored| FreebaseScoredEntity::from_scored(model, scored))
			.collect::<Result<Vec<_>>>()?;

		Ok(FreebaseEntityResult { result })
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
	pub responses: BTreeMap<String, EntityMatches>,
}
impl MatchResponse {
	pub fn to_freebase(&self, model: &Model) -> Result<FreebaseQueryResult> {
		self.responses
			.iter()
			.map(|(key, matches)| Ok((key.clone(), matches.to_freebase(model)?)))
			.collect()
	}
}

impl ReconService {
	/// Scores index candidates for every example in `request` against `dataset`.
	pub async fn match_entities(
		&self,
		dataset: &str,
		request: MatchRequest,
		params: MatchParams,
	) -> Result<MatchResponse> {
		let datasets = self.datasets.datasets().await?;
		let dataset = datasets.get(dataset).ok_or_else(|| Error::NotFound {
			message: format!("No such dataset: {dataset}."),
		})?;

		if request.queries.is_empty() {
			return Err(Error::InvalidRequest { message: "No queries provided.".to_string() });
		}

		let limit =
			params.limit.unwrap_or(self.cfg.search.default_limit).min(self.cfg.search.max_limit);
		let threshold = params.threshold.unwrap_or(self.cfg.scoring.threshold);
		let cutoff = params.cutoff.unwrap_or(self.cfg.scoring.cutoff);

		if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
			return Err(Error::InvalidRequest {
				message: "threshold must be between 0.0 and 1.0.".to_string(),
			});
		}
		if !cutoff.is_finite() || cutoff < 0.0 {
			return Err(Error::InvalidRequest {
				message: "cutoff must be zero or greater.".to_string(),
			});
		}

		let mut responses = BTreeMap::new();

		for (key, example) in request.queries {
			let entity = Entity::from_example(&self.model, example)?;

			if !entity.schema.matchable {
				return Err(Error::InvalidRequest {
					message: format!("Schema {} cannot be matched.", entity.schema.name),
				});
			}

			let doc = query::entity_query(&self.model, dataset, &entity, params.fuzzy);
			let candidates = self
				.query_entities(doc, limit.saturating_mul(self.cfg.search.match_candidates))
				.await?
				.map(|(candidate, _)| candidate);
			let results = scoring::score_results(
				self.algorithm.as_ref(),
				&entity,
				candidates,
				threshold,
				cutoff,
				Some(limit),
			);

			tracing::debug!(query = %key, results = results.len(), "Match query scored.");

			responses.insert(
				key,
				EntityMatches {
					status: 200,
					total: results.len(),
					results,
					query: entity.to_dict(),
				},
			);
		}

		Ok(MatchResponse { responses })
	}
}
