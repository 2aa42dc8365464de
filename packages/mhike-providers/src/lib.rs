pub mod embedding;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

pub const API_KEY_HEADER: &str = "x-goog-api-key";

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	let mut key: HeaderValue = api_key.parse()?;

	key.set_sensitive(true);
	headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

	for (name, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(name.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Builds the shared HTTP client. Requests rely on transport defaults when `timeout_ms` is unset.
pub fn http_client(timeout_ms: Option<u64>) -> Result<Client> {
	let mut builder = Client::builder();

	if let Some(timeout_ms) = timeout_ms {
		builder = builder.timeout(Duration::from_millis(timeout_ms));
	}

	Ok(builder.build()?)
}
