use std::collections::{BTreeMap, BTreeSet};

use recon_config::DatasetConfig;

use crate::{Error, Result};

/// A named source collection. Leaves are indexed sources; collections group other datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
	pub name: String,
	pub title: String,
	pub children: Vec<String>,
	source_names: Vec<String>,
}
impl Dataset {
	pub fn is_collection(&self) -> bool {
		!self.children.is_empty()
	}

	/// Names of the leaf sources this dataset covers, sorted.
	pub fn source_names(&self) -> &[String] {
		&self.source_names
	}
}

#[derive(Debug, Clone, Default)]
pub struct Datasets {
	datasets: BTreeMap<String, Dataset>,
}
impl Datasets {
	pub fn from_config(entries: &[DatasetConfig]) -> Result<Self> {
		let configs: BTreeMap<&str, &DatasetConfig> =
			entries.iter().map(|entry| (entry.name.as_str(), entry)).collect();

		if configs.len() != entries.len() {
			return Err(Error::InvalidDatasets {
				message: "dataset names must be unique.".to_string(),
			});
		}

		let mut datasets = BTreeMap::new();

		for entry in entries {
			let mut sources = BTreeSet::new();

			collect_sources(&entry.name, &configs, &mut Vec::new(), &mut sources)?;

			datasets.insert(
				entry.name.clone(),
				Dataset {
					name: entry.name.clone(),
					title: entry.title.clone(),
					children: entry.children.clone(),
					source_names: sources.into_iter().collect(),
				},
			);
		}

		Ok(Self { datasets })
	}

	pub fn get(&self, name: &str) -> Option<&Dataset> {
		self.datasets.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.datasets.contains_key(name)
	}
}

fn collect_sources(
	name: &str,
	configs: &BTreeMap<&str, &DatasetConfig>,
	path: &mut Vec<String>,
	out: &mut BTreeSet<String>,
) -> Result<()> {
	if path.iter().any(|seen| seen == name) {
		return Err(Error::InvalidDatasets {
			message: format!("dataset {name} contains itself via {}.", path.join(" -> ")),
		});
	}

	let config = configs.get(name).ok_or_else(|| Error::InvalidDatasets {
		message: format!("unknown dataset {name}."),
	})?;

	if config.children.is_empty() {
		out.insert(name.to_string());

		return Ok(());
	}

	path.push(name.to_string());

	for child in &config.children {
		collect_sources(child, configs, path, out)?;
	}

	path.pop();

	Ok(())
}
