pub mod candidate;
pub mod collect;
pub mod rank;
pub mod search;

mod error;

pub use candidate::{CandidateItem, CandidateKind, ItemType, ScoredItem, SearchScope};
pub use error::{Error, Result};
pub use mhike_storage::{BoxFuture, DocumentStore};
pub use search::{HealthReport, SearchRequest, SearchResponse, SearchResult, ServiceInfo};

use std::sync::Arc;

use mhike_config::{Config, EmbeddingProviderConfig};
use mhike_providers::embedding;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mhike_providers::Result<Vec<f32>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}

	/// HTTP-backed providers sharing one client for the life of the process.
	pub fn from_config(cfg: &EmbeddingProviderConfig) -> mhike_providers::Result<Self> {
		let client = mhike_providers::http_client(cfg.timeout_ms)?;

		Ok(Self { embedding: Arc::new(HttpEmbedding { client }) })
	}
}

pub struct MhikeService {
	pub cfg: Config,
	pub store: Arc<dyn DocumentStore>,
	pub providers: Providers,
}
impl MhikeService {
	pub fn new(cfg: Config, store: Arc<dyn DocumentStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	pub(crate) fn default_scope(&self) -> SearchScope {
		self.cfg.search.default_scope.parse().unwrap_or_default()
	}
}

struct HttpEmbedding {
	client: reqwest::Client,
}
impl EmbeddingProvider for HttpEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mhike_providers::Result<Vec<f32>>> {
		Box::pin(embedding::embed(&self.client, cfg, text))
	}
}
