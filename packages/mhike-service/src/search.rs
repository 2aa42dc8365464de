use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
	Error, MhikeService, Result,
	candidate::{CandidateKind, ItemType, ScoredItem, SearchScope},
	collect, rank,
};

pub const SERVICE_NAME: &str = "M-Hike Vector Search API";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(alias = "firebase_uid")]
	pub owner_id: String,
	/// Falls back to `search.default_scope`.
	#[serde(default, alias = "search_type")]
	pub scope: Option<SearchScope>,
	/// Falls back to `search.default_top_k`. Zero or negative returns no results.
	#[serde(default)]
	pub top_k: Option<i64>,
}

/// One ranked hit. Fields that do not apply to `type` are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub id: String,
	#[serde(rename = "type")]
	pub item_type: ItemType,
	pub score: f32,
	pub name: Option<String>,
	pub location: Option<String>,
	pub description: Option<String>,
	pub observation_text: Option<String>,
	pub comments: Option<String>,
	pub hike_id: Option<i64>,
}
impl From<&ScoredItem> for SearchResult {
	fn from(scored: &ScoredItem) -> Self {
		let item = &scored.item;
		let base = Self {
			id: item.id.clone(),
			item_type: item.item_type(),
			score: scored.score,
			name: None,
			location: None,
			description: None,
			observation_text: None,
			comments: None,
			hike_id: item.hike_id,
		};

		match &item.kind {
			CandidateKind::Hike { name, location, description } => Self {
				name: Some(name.clone()),
				location: Some(location.clone()),
				description: Some(description.clone()),
				..base
			},
			CandidateKind::Observation { observation_text, comments, location } => Self {
				observation_text: Some(observation_text.clone()),
				comments: Some(comments.clone()),
				location: Some(location.clone()),
				..base
			},
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub results: Vec<SearchResult>,
	pub query_embedding_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
	pub status: String,
	/// Serialized under the name existing mobile clients read.
	#[serde(rename = "gemini_configured", alias = "embedding_configured")]
	pub embedding_configured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
	pub message: String,
	pub status: String,
}

impl MhikeService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		if req.owner_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "owner_id is required.".to_string() });
		}

		let scope = req.scope.unwrap_or_else(|| self.default_scope());
		let top_k = req.top_k.unwrap_or(self.cfg.search.default_top_k);
		let trace_id = Uuid::new_v4();
		let span = tracing::info_span!(
			"search",
			%trace_id,
			owner_id = %req.owner_id,
			scope = scope.as_str(),
			top_k,
		);

		self.run_search(&req.query, &req.owner_id, scope, top_k).instrument(span).await
	}

	pub fn health(&self) -> HealthReport {
		HealthReport {
			status: "healthy".to_string(),
			embedding_configured: !self.cfg.providers.embedding.api_key.trim().is_empty(),
		}
	}

	pub fn info(&self) -> ServiceInfo {
		ServiceInfo { message: SERVICE_NAME.to_string(), status: "running".to_string() }
	}

	async fn run_search(
		&self,
		query: &str,
		owner_id: &str,
		scope: SearchScope,
		top_k: i64,
	) -> Result<SearchResponse> {
		let query_vec = self.embed_query(query).await?;
		let candidates = collect::collect_candidates(self.store.as_ref(), owner_id, scope).await?;
		let candidate_count = candidates.len();
		let ranked = rank::rank(&query_vec, candidates, top_k)?;
		let results: Vec<SearchResult> = ranked.iter().map(SearchResult::from).collect();

		tracing::info!(
			candidates = candidate_count,
			results = results.len(),
			query_dim = query_vec.len(),
			"Search completed."
		);

		Ok(SearchResponse { results, query_embedding_length: query_vec.len() })
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let query_vec =
			self.providers.embedding.embed(&self.cfg.providers.embedding, query).await?;

		if query_vec.is_empty() {
			return Err(Error::Embedding {
				message: "Embedding provider returned an empty vector.".to_string(),
			});
		}

		Ok(query_vec)
	}
}
