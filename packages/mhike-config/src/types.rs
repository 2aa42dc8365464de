use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub firestore: Firestore,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Firestore {
	pub api_base: String,
	pub project_id: String,
	#[serde(default = "default_database")]
	pub database: String,
	/// Google service-account key file used to mint and refresh access tokens.
	/// `FIREBASE_SERVICE_ACCOUNT_PATH` overrides it.
	pub service_account_path: Option<String>,
	/// Static bearer token. When set it takes precedence over `service_account_path` and is never
	/// refreshed. `FIRESTORE_ACCESS_TOKEN` overrides it.
	#[serde(default)]
	pub access_token: String,
	/// Documents requested per list page. Every page is always read.
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// `GEMINI_API_KEY` overrides it.
	#[serde(default)]
	pub api_key: String,
	pub model: String,
	/// No timeout is applied when unset.
	pub timeout_ms: Option<u64>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_top_k")]
	pub default_top_k: i64,
	/// One of `hikes`, `observations`, or `all`.
	#[serde(default = "default_scope")]
	pub default_scope: String,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_top_k: default_top_k(), default_scope: default_scope() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_database() -> String {
	"(default)".to_string()
}

fn default_page_size() -> u32 {
	300
}

fn default_top_k() -> i64 {
	10
}

fn default_scope() -> String {
	"hikes".to_string()
}
