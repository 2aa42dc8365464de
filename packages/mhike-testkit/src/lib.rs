use serde_json::{Map, Value, json};

use mhike_config::{
	Config, EmbeddingProviderConfig, Firestore, Providers, Search, Service, Storage,
};
use mhike_storage::{
	BoxFuture, DocumentStore, Error, Result, memory::MemoryStore, models::Document,
};

pub const TEST_OWNER: &str = "owner-1";
pub const OTHER_OWNER: &str = "owner-2";

/// A valid configuration pointing at unroutable placeholder endpoints.
pub fn test_config() -> Config {
	test_config_with_bases("http://127.0.0.1:9/v1", "http://127.0.0.1:9/v1beta")
}

pub fn test_config_with_bases(firestore_base: &str, embedding_base: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			firestore: Firestore {
				api_base: firestore_base.to_string(),
				project_id: "m-hike-test".to_string(),
				database: "(default)".to_string(),
				service_account_path: None,
				access_token: "test-token".to_string(),
				page_size: 300,
				timeout_ms: Some(5_000),
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: embedding_base.to_string(),
				api_key: "test-key".to_string(),
				model: "models/test-embed".to_string(),
				timeout_ms: Some(5_000),
				default_headers: Map::new(),
			},
		},
		search: Search::default(),
	}
}

/// Builds a document from a JSON object literal. Non-object values yield no fields.
pub fn document(key: &str, fields: Value) -> Document {
	let fields = match fields {
		Value::Object(fields) => fields,
		_ => Map::new(),
	};

	Document::new(key, fields)
}

/// Two hikes and three observations for [`TEST_OWNER`].
///
/// Hike `1` and observations `o1`, `o3` carry embeddings; hike `2` and observation `o2` do
/// not. Observation `o3` sits under hike `2`.
pub fn trail_store() -> MemoryStore {
	MemoryStore::new()
		.with_hike(
			TEST_OWNER,
			document(
				"1",
				json!({
					"name": "Snowdon Ranger Path",
					"location": "Snowdonia",
					"description": "Steady climb past Llyn Cwellyn",
					"embedding_vector": [1.0, 0.0]
				}),
			),
		)
		.with_hike(
			TEST_OWNER,
			document("2", json!({ "name": "Malham Cove", "location": "Yorkshire Dales" })),
		)
		.with_observation(
			TEST_OWNER,
			"1",
			document(
				"o1",
				json!({
					"observationText": "Waterfall after the rain",
					"comments": "loud",
					"location": "Snowdonia",
					"embedding_vector": [0.6, 0.8]
				}),
			),
		)
		.with_observation(
			TEST_OWNER,
			"1",
			document("o2", json!({ "observationText": "Sheep on the path" })),
		)
		.with_observation(
			TEST_OWNER,
			"2",
			document(
				"o3",
				json!({
					"observationText": "Limestone pavement",
					"location": "Yorkshire Dales",
					"embedding_vector": [0.0, 1.0]
				}),
			),
		)
}

/// A store whose every read fails as if the backend were down.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;
impl DocumentStore for FailingStore {
	fn list_hikes<'a>(&'a self, _owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async { Err(Error::Unavailable("document store is offline".to_string())) })
	}

	fn list_observations<'a>(
		&'a self,
		_owner_id: &'a str,
		_hike_key: &'a str,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async { Err(Error::Unavailable("document store is offline".to_string())) })
	}
}

/// Lists hikes from `inner` but fails every observation read.
#[derive(Debug, Clone)]
pub struct FailingObservationsStore {
	pub inner: MemoryStore,
}
impl DocumentStore for FailingObservationsStore {
	fn list_hikes<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Document>>> {
		self.inner.list_hikes(owner_id)
	}

	fn list_observations<'a>(
		&'a self,
		_owner_id: &'a str,
		hike_key: &'a str,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move {
			Err(Error::Unavailable(format!("observations of hike {hike_key} are unreadable")))
		})
	}
}
