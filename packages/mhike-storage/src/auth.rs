use std::{
	fmt::{Debug, Formatter, Result as FmtResult},
	fs,
	path::Path,
	time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, header::HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{Error, Result};

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3_600;
const DEFAULT_EXPIRES_IN_SECS: u64 = 3_600;
const MAX_ERROR_BODY_CHARS: usize = 512;
/// Tokens are renewed this long before their reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a Google service-account key file that token minting needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
	pub client_email: String,
	pub private_key: String,
	#[serde(default)]
	pub private_key_id: Option<String>,
	#[serde(default = "default_token_uri")]
	pub token_uri: String,
}
impl ServiceAccountKey {
	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path).map_err(|err| {
			Error::Credentials(format!(
				"Failed to read service account key {}: {err}.",
				path.display()
			))
		})?;

		Self::from_json(&raw)
	}

	pub fn from_json(raw: &str) -> Result<Self> {
		serde_json::from_str(raw)
			.map_err(|err| Error::Credentials(format!("Invalid service account key: {err}.")))
	}
}
impl Debug for ServiceAccountKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("ServiceAccountKey")
			.field("client_email", &self.client_email)
			.field("private_key", &"<redacted>")
			.field("private_key_id", &self.private_key_id)
			.field("token_uri", &self.token_uri)
			.finish()
	}
}

/// Where the `Authorization` header for Firestore reads comes from.
pub enum TokenSource {
	Static(HeaderValue),
	ServiceAccount(ServiceAccountTokens),
}
impl TokenSource {
	pub fn fixed(token: &str) -> Result<Self> {
		Ok(Self::Static(bearer(token)?))
	}

	pub async fn authorization(&self) -> Result<HeaderValue> {
		match self {
			Self::Static(value) => Ok(value.clone()),
			Self::ServiceAccount(tokens) => tokens.authorization().await,
		}
	}
}

/// Mints OAuth access tokens from a service-account key with the JWT bearer grant and caches
/// them until shortly before they expire.
pub struct ServiceAccountTokens {
	client: Client,
	key: ServiceAccountKey,
	signing_key: EncodingKey,
	cached: Mutex<Option<CachedToken>>,
}
impl ServiceAccountTokens {
	pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self> {
		let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;

		Ok(Self { client, key, signing_key, cached: Mutex::new(None) })
	}

	pub fn client_email(&self) -> &str {
		&self.key.client_email
	}

	pub async fn authorization(&self) -> Result<HeaderValue> {
		// Held across the refresh so concurrent requests mint at most one token.
		let mut cached = self.cached.lock().await;

		if let Some(token) = cached.as_ref().filter(|token| Instant::now() < token.refresh_at) {
			return Ok(token.authorization.clone());
		}

		let token = self.mint().await?;
		let authorization = token.authorization.clone();

		*cached = Some(token);

		Ok(authorization)
	}

	async fn mint(&self) -> Result<CachedToken> {
		let assertion = self.assertion()?;
		let res = self
			.client
			.post(&self.key.token_uri)
			.form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
			.send()
			.await?;
		let status = res.status();

		if !status.is_success() {
			let detail = res.text().await.unwrap_or_default();

			tracing::warn!(
				%status,
				client_email = %self.key.client_email,
				"Token endpoint rejected the assertion."
			);

			return Err(Error::Credentials(format!(
				"Token endpoint returned {status}: {}",
				crate::firestore::truncate(&detail, MAX_ERROR_BODY_CHARS)
			)));
		}

		let body: TokenResponse = res.json().await?;
		let lifetime = Duration::from_secs(body.expires_in);

		tracing::debug!(expires_in = body.expires_in, "Minted Firestore access token.");

		Ok(CachedToken {
			authorization: bearer(&body.access_token)?,
			refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
		})
	}

	fn assertion(&self) -> Result<String> {
		let iat = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|elapsed| elapsed.as_secs())
			.unwrap_or_default();
		let claims = Claims {
			iss: &self.key.client_email,
			scope: DATASTORE_SCOPE,
			aud: &self.key.token_uri,
			iat,
			exp: iat + ASSERTION_LIFETIME_SECS,
		};
		let mut header = Header::new(Algorithm::RS256);

		header.kid = self.key.private_key_id.clone();

		Ok(jsonwebtoken::encode(&header, &claims, &self.signing_key)?)
	}
}

struct CachedToken {
	authorization: HeaderValue,
	refresh_at: Instant,
}

#[derive(Serialize)]
struct Claims<'a> {
	iss: &'a str,
	scope: &'a str,
	aud: &'a str,
	iat: u64,
	exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	#[serde(default = "default_expires_in")]
	expires_in: u64,
}

fn bearer(token: &str) -> Result<HeaderValue> {
	let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;

	value.set_sensitive(true);

	Ok(value)
}

fn default_token_uri() -> String {
	DEFAULT_TOKEN_URI.to_string()
}

fn default_expires_in() -> u64 {
	DEFAULT_EXPIRES_IN_SECS
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_defaults_token_uri() {
		let key = ServiceAccountKey::from_json(
			r#"{ "client_email": "a@b.iam.gserviceaccount.com", "private_key": "pem" }"#,
		)
		.expect("key parses");

		assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
		assert_eq!(key.private_key_id, None);
	}

	#[test]
	fn malformed_key_is_a_credentials_error() {
		let err = ServiceAccountKey::from_json(r#"{ "client_email": 1 }"#).expect_err("rejected");

		assert!(matches!(err, Error::Credentials(_)), "Unexpected error: {err:?}");

		let key = ServiceAccountKey::from_json(
			r#"{ "client_email": "a@b.iam.gserviceaccount.com", "private_key": "not a pem" }"#,
		)
		.expect("key parses");

		assert!(ServiceAccountTokens::new(Client::new(), key).is_err());
	}

	#[test]
	fn static_token_is_a_sensitive_bearer() {
		let value = bearer("abc").expect("valid header");

		assert_eq!(value, "Bearer abc");
		assert!(value.is_sensitive());
	}
}
