mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Firestore, Providers, Search, Service, Storage,
};

use std::{env, fs, net::SocketAddr, path::Path};

pub const ENV_EMBEDDING_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_FIRESTORE_ACCESS_TOKEN: &str = "FIRESTORE_ACCESS_TOKEN";
pub const ENV_FIREBASE_SERVICE_ACCOUNT_PATH: &str = "FIREBASE_SERVICE_ACCOUNT_PATH";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";

pub const SEARCH_SCOPES: [&str; 3] = ["hikes", "observations", "all"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env_overrides(&mut cfg, |key| env::var(key).ok());

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Overlays credentials and the bind address from the environment.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

	if let Some(api_key) = present(ENV_EMBEDDING_API_KEY) {
		cfg.providers.embedding.api_key = api_key;
	}
	if let Some(token) = present(ENV_FIRESTORE_ACCESS_TOKEN) {
		cfg.storage.firestore.access_token = token;
	}
	if let Some(path) = present(ENV_FIREBASE_SERVICE_ACCOUNT_PATH) {
		cfg.storage.firestore.service_account_path = Some(path);
	}

	let host = present(ENV_HOST);
	let port = present(ENV_PORT);

	if host.is_none() && port.is_none() {
		return;
	}

	let (current_host, current_port) = match cfg.service.http_bind.rsplit_once(':') {
		Some((host, port)) => (host.to_string(), port.to_string()),
		None => (cfg.service.http_bind.clone(), String::new()),
	};
	let host = host.map(|host| bracket_ipv6(host.trim())).unwrap_or(current_host);
	let port = port.map(|port| port.trim().to_string()).unwrap_or(current_port);

	cfg.service.http_bind = format!("{host}:{port}");
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.parse::<SocketAddr>().is_err() {
		return Err(Error::Validation {
			message: "service.http_bind must be a socket address such as 0.0.0.0:8000."
				.to_string(),
		});
	}

	let firestore = &cfg.storage.firestore;

	for (label, value) in [
		("storage.firestore.api_base", &firestore.api_base),
		("storage.firestore.project_id", &firestore.project_id),
		("storage.firestore.database", &firestore.database),
		("providers.embedding.api_base", &cfg.providers.embedding.api_base),
		("providers.embedding.model", &cfg.providers.embedding.model),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	let has_service_account =
		firestore.service_account_path.as_deref().is_some_and(|path| !path.trim().is_empty());

	if firestore.access_token.trim().is_empty() && !has_service_account {
		return Err(Error::Validation {
			message: format!(
				"storage.firestore needs a service_account_path or an access_token; set one in the config file or via {ENV_FIREBASE_SERVICE_ACCOUNT_PATH} or {ENV_FIRESTORE_ACCESS_TOKEN}."
			),
		});
	}
	if firestore.page_size == 0 {
		return Err(Error::Validation {
			message: "storage.firestore.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: format!(
				"providers.embedding.api_key must be non-empty; set it in the config file or via {ENV_EMBEDDING_API_KEY}."
			),
		});
	}
	if cfg.providers.embedding.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "providers.embedding.default_headers values must be strings.".to_string(),
		});
	}

	for (label, timeout) in [
		("storage.firestore.timeout_ms", firestore.timeout_ms),
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
	] {
		if timeout == Some(0) {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero when set."),
			});
		}
	}

	if cfg.search.default_top_k <= 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if !SEARCH_SCOPES.contains(&cfg.search.default_scope.as_str()) {
		return Err(Error::Validation {
			message: "search.default_scope must be one of hikes, observations, or all."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.firestore.api_base =
		cfg.storage.firestore.api_base.trim().trim_end_matches('/').to_string();
	cfg.storage.firestore.service_account_path = cfg
		.storage
		.firestore
		.service_account_path
		.take()
		.map(|path| path.trim().to_string())
		.filter(|path| !path.is_empty());
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim().trim_end_matches('/').to_string();
	cfg.search.default_scope = cfg.search.default_scope.trim().to_ascii_lowercase();
}

fn bracket_ipv6(host: &str) -> String {
	if host.contains(':') && !host.starts_with('[') {
		format!("[{host}]")
	} else {
		host.to_string()
	}
}
