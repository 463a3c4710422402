mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, DatasetConfig, Index, Model, Reconcile, Scoring, Search, Service};

use std::{collections::HashSet, fs, path::Path};

pub const SCORING_ALGORITHMS: [&str; 1] = ["name-overlap"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("index.url", &cfg.index.url),
		("index.name", &cfg.index.name),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !cfg.index.url.starts_with("http://") && !cfg.index.url.starts_with("https://") {
		return Err(Error::Validation {
			message: "index.url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.index.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "index.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.index.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "index.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.search.max_limit == 0 {
		return Err(Error::Validation {
			message: "search.max_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 || cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must be between 1 and search.max_limit.".to_string(),
		});
	}
	if cfg.search.match_candidates == 0 {
		return Err(Error::Validation {
			message: "search.match_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.search.facets.iter().any(|field| field.trim().is_empty()) {
		return Err(Error::Validation {
			message: "search.facets must not contain empty field names.".to_string(),
		});
	}
	if !SCORING_ALGORITHMS.contains(&cfg.scoring.algorithm.as_str()) {
		return Err(Error::Validation {
			message: format!(
				"scoring.algorithm must be one of {}.",
				SCORING_ALGORITHMS.join(", ")
			),
		});
	}
	if !cfg.scoring.threshold.is_finite() {
		return Err(Error::Validation {
			message: "scoring.threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.scoring.threshold) {
		return Err(Error::Validation {
			message: "scoring.threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !cfg.scoring.cutoff.is_finite() {
		return Err(Error::Validation {
			message: "scoring.cutoff must be a finite number.".to_string(),
		});
	}
	if cfg.scoring.cutoff < 0.0 {
		return Err(Error::Validation {
			message: "scoring.cutoff must be zero or greater.".to_string(),
		});
	}
	if cfg.reconcile.preview_width == 0 || cfg.reconcile.preview_height == 0 {
		return Err(Error::Validation {
			message: "reconcile.preview_width and reconcile.preview_height must be greater than zero."
				.to_string(),
		});
	}
	if cfg.datasets.is_empty() {
		return Err(Error::Validation {
			message: "At least one [[datasets]] entry is required.".to_string(),
		});
	}

	let mut names = HashSet::new();

	for dataset in &cfg.datasets {
		if dataset.name.trim().is_empty() {
			return Err(Error::Validation {
				message: "datasets.name must be non-empty.".to_string(),
			});
		}
		if !names.insert(dataset.name.as_str()) {
			return Err(Error::Validation {
				message: format!("Dataset {} is defined more than once.", dataset.name),
			});
		}
	}

	for dataset in &cfg.datasets {
		for child in &dataset.children {
			if child == &dataset.name {
				return Err(Error::Validation {
					message: format!("Dataset {} must not list itself as a child.", dataset.name),
				});
			}
			if !names.contains(child.as_str()) {
				return Err(Error::Validation {
					message: format!(
						"Dataset {} references unknown child dataset {child}.",
						dataset.name
					),
				});
			}
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.index.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.index.api_key = None;
	}

	let trimmed = cfg.index.url.trim().trim_end_matches('/');

	if trimmed.len() != cfg.index.url.len() {
		cfg.index.url = trimmed.to_string();
	}
}
