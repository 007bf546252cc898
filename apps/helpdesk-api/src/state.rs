use std::sync::Arc;

use helpdesk_service::HelpdeskService;
use helpdesk_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<HelpdeskService>,
}
impl AppState {
	pub async fn new(config: helpdesk_config::Config) -> color_eyre::Result<Self> {
		let qdrant = QdrantStore::connect(&config.storage.qdrant).await?;
		let service = HelpdeskService::new(config, qdrant)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: HelpdeskService) -> Self {
		Self { service: Arc::new(service) }
	}
}
