use std::sync::Arc;

use recon_service::ReconService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ReconService>,
}
impl AppState {
	pub fn new(config: recon_config::Config) -> color_eyre::Result<Self> {
		let service = ReconService::from_config(config)?;

		Ok(Self { service: Arc::new(service) })
	}
}
