use serde_json::Value;

use crate::{ReconService, Result};

const HEALTHY_STATUSES: [&str; 2] = ["yellow", "green"];

impl ReconService {
	/// Storage statistics of the configured index, if the cluster reports any.
	pub async fn get_index_stats(&self) -> Result<Option<Value>> {
		let mut stats = self.index.stats().await?;
		let index = self.index.index_name();

		Ok(stats.get_mut("indices").and_then(|indices| indices.get_mut(index)).map(Value::take))
	}

	/// Whether the index can serve queries. Transport failures count as unhealthy.
	pub async fn get_index_status(&self) -> Result<bool> {
		let health = match self.index.cluster_health().await {
			Ok(health) => health,
			Err(err) if err.is_transport() => {
				tracing::warn!(
					error = %err,
					index = self.index.index_name(),
					"Index health check failed."
				);

				return Ok(false);
			},
			Err(err) => return Err(err.into()),
		};
		let status = health.get("status").and_then(Value::as_str).unwrap_or_default();

		Ok(HEALTHY_STATUSES.contains(&status))
	}
}
