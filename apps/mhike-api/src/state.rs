use std::sync::Arc;

use mhike_service::{MhikeService, Providers};
use mhike_storage::firestore::FirestoreStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MhikeService>,
}
impl AppState {
	/// Builds the Firestore reader and the embedding client once for the process.
	pub fn new(config: mhike_config::Config) -> color_eyre::Result<Self> {
		let store = FirestoreStore::new(&config.storage.firestore)?;
		let providers = Providers::from_config(&config.providers.embedding)?;
		let service = MhikeService::new(config, Arc::new(store), providers);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: MhikeService) -> Self {
		Self { service: Arc::new(service) }
	}
}
