use std::{
	collections::{BTreeMap, BTreeSet},
	sync::Arc,
};

use serde::Serialize;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use unicode_segmentation::UnicodeSegmentation;

use recon_model::{Entity, PropertyType};

use crate::{Error, Result};

pub const NAME_OVERLAP: &str = "name-overlap";

const NAME_OVERLAP_FEATURE: &str = "name_token_overlap";

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingResult {
	pub score: f64,
	pub features: BTreeMap<String, f64>,
}

/// Compares a query entity against one candidate.
pub trait ScoringAlgorithm
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn compare(&self, query: &Entity, candidate: &Entity) -> MatchingResult;
}

/// Best token-set overlap between any query name and any candidate name.
///
/// Names are decomposed, stripped of combining marks, lowercased and split into words before
/// comparison, so "Müller" and "MULLER" share a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOverlap;

impl ScoringAlgorithm for NameOverlap {
	fn name(&self) -> &'static str {
		NAME_OVERLAP
	}

	fn compare(&self, query: &Entity, candidate: &Entity) -> MatchingResult {
		let left: Vec<BTreeSet<String>> =
			query.get_type_values(PropertyType::Name).into_iter().map(name_tokens).collect();
		let right: Vec<BTreeSet<String>> =
			candidate.get_type_values(PropertyType::Name).into_iter().map(name_tokens).collect();
		let mut best = 0.0_f64;

		for lhs in &left {
			for rhs in &right {
				best = best.max(jaccard(lhs, rhs));
			}
		}

		MatchingResult {
			score: best,
			features: BTreeMap::from([(NAME_OVERLAP_FEATURE.to_string(), best)]),
		}
	}
}

pub fn algorithm_from_name(name: &str) -> Result<Arc<dyn ScoringAlgorithm>> {
	match name {
		NAME_OVERLAP => Ok(Arc::new(NameOverlap)),
		other => Err(Error::Model { message: format!("Unknown scoring algorithm: {other}.") }),
	}
}

fn name_tokens(name: &str) -> BTreeSet<String> {
	let folded: String = name.nfkd().filter(|ch| !is_combining_mark(*ch)).collect();

	folded.to_lowercase().unicode_words().map(str::to_string).collect()
}

fn jaccard(lhs: &BTreeSet<String>, rhs: &BTreeSet<String>) -> f64 {
	let union = lhs.union(rhs).count();

	if union == 0 {
		return 0.0;
	}

	lhs.intersection(rhs).count() as f64 / union as f64
}

/// A candidate entity with its score against the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntityResponse {
	pub id: String,
	pub caption: String,
	pub schema: String,
	pub properties: BTreeMap<String, Vec<String>>,
	pub datasets: Vec<String>,
	pub referents: Vec<String>,
	pub target: bool,
	pub first_seen: Option<String>,
	pub last_seen: Option<String>,
	pub score: f64,
	pub features: BTreeMap<String, f64>,
	#[serde(rename = "match")]
	pub match_: bool,
}
impl ScoredEntityResponse {
	pub fn from_entity_result(entity: Entity, result: MatchingResult, threshold: f64) -> Self {
		Self {
			id: entity.id,
			caption: entity.caption,
			schema: entity.schema.name.clone(),
			properties: entity.properties,
			datasets: entity.datasets,
			referents: entity.referents,
			target: entity.target,
			first_seen: entity.first_seen,
			last_seen: entity.last_seen,
			score: result.score,
			features: result.features,
			match_: result.score >= threshold,
		}
	}
}

/// Scores `results` against `entity` and returns the survivors best first.
///
/// Candidates scoring at or below `cutoff` are dropped. Equal scores keep their input order.
pub fn score_results<I>(
	algorithm: &dyn ScoringAlgorithm,
	entity: &Entity,
	results: I,
	threshold: f64,
	cutoff: f64,
	limit: Option<usize>,
) -> Vec<ScoredEntityResponse>
where
	I: IntoIterator<Item = Entity>,
{
	let mut scored = Vec::new();
	let mut matches = 0_usize;

	for candidate in results {
		let result = algorithm.compare(entity, &candidate);
		let response = ScoredEntityResponse::from_entity_result(candidate, result, threshold);

		if response.score <= cutoff {
			continue;
		}
		if response.match_ {
			matches += 1;
		}

		scored.push(response);
	}

	scored.sort_by(|lhs, rhs| rhs.score.total_cmp(&lhs.score));

	if let Some(limit) = limit {
		scored.truncate(limit);
	}

	tracing::debug!(
		algorithm = algorithm.name(),
		query = %entity.id,
		candidates = scored.len(),
		matches,
		"Scored match candidates."
	);

	scored
}
