use std::{path::Path, time::Duration};

use reqwest::{Client, Url, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
	BoxFuture, DocumentStore, Error, HIKES_COLLECTION, OBSERVATIONS_COLLECTION, Result,
	USERS_COLLECTION,
	auth::{ServiceAccountKey, ServiceAccountTokens, TokenSource},
	models::Document,
};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Firestore REST v1 reader.
pub struct FirestoreStore {
	client: Client,
	documents_url: Url,
	auth: TokenSource,
	page_size: u32,
}
impl FirestoreStore {
	/// A non-empty `access_token` is used as-is. Otherwise tokens are minted from the
	/// service-account key and refreshed before they expire.
	pub fn new(cfg: &mhike_config::Firestore) -> Result<Self> {
		let documents_url = Url::parse(&format!(
			"{}/projects/{}/databases/{}/documents",
			cfg.api_base.trim_end_matches('/'),
			cfg.project_id,
			cfg.database
		))
		.map_err(|err| Error::InvalidConfig(format!("Invalid Firestore api_base: {err}.")))?;

		if documents_url.cannot_be_a_base() {
			return Err(Error::InvalidConfig(
				"Firestore api_base must be an absolute http(s) URL.".to_string(),
			));
		}

		let mut builder = Client::builder();

		if let Some(timeout_ms) = cfg.timeout_ms {
			builder = builder.timeout(Duration::from_millis(timeout_ms));
		}

		let client = builder.build()?;
		let auth = token_source(cfg, &client)?;

		Ok(Self { client, documents_url, auth, page_size: cfg.page_size.max(1) })
	}

	pub fn collection_url(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.documents_url.clone();

		url.path_segments_mut()
			.map_err(|_| {
				Error::InvalidConfig("Firestore api_base cannot hold a path.".to_string())
			})?
			.extend(segments);

		Ok(url)
	}

	/// Reads every page of one collection.
	async fn list_collection(&self, segments: &[&str]) -> Result<Vec<Document>> {
		let base = self.collection_url(segments)?;
		let mut documents = Vec::new();
		let mut page_token: Option<String> = None;

		loop {
			let mut url = base.clone();

			{
				let mut query = url.query_pairs_mut();

				query.append_pair("pageSize", &self.page_size.to_string());

				if let Some(token) = page_token.as_deref() {
					query.append_pair("pageToken", token);
				}
			}

			let authorization = self.auth.authorization().await?;
			let res = self.client.get(url).header(AUTHORIZATION, authorization).send().await?;
			let status = res.status();

			if !status.is_success() {
				let detail = res.text().await.unwrap_or_default();

				return Err(Error::Unavailable(format!(
					"Firestore returned {status} for {}: {}",
					segments.join("/"),
					truncate(&detail, MAX_ERROR_BODY_CHARS)
				)));
			}

			let page: ListDocumentsResponse = res.json().await?;

			documents.extend(page.documents.into_iter().map(RawDocument::decode));

			match page.next_page_token.filter(|token| !token.is_empty()) {
				Some(token) => page_token = Some(token),
				None => break,
			}
		}

		tracing::debug!(
			collection = %segments.join("/"),
			count = documents.len(),
			"Listed Firestore collection."
		);

		Ok(documents)
	}
}
impl DocumentStore for FirestoreStore {
	fn list_hikes<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move {
			self.list_collection(&[USERS_COLLECTION, owner_id, HIKES_COLLECTION]).await
		})
	}

	fn list_observations<'a>(
		&'a self,
		owner_id: &'a str,
		hike_key: &'a str,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move {
			self.list_collection(&[
				USERS_COLLECTION,
				owner_id,
				HIKES_COLLECTION,
				hike_key,
				OBSERVATIONS_COLLECTION,
			])
			.await
		})
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
	#[serde(default)]
	documents: Vec<RawDocument>,
	next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
	name: String,
	#[serde(default)]
	fields: Map<String, Value>,
}
impl RawDocument {
	fn decode(self) -> Document {
		let fields = self.fields.iter().map(|(name, value)| (name.clone(), decode_value(value)));

		Document::new(document_key(&self.name), fields.collect())
	}
}

fn token_source(cfg: &mhike_config::Firestore, client: &Client) -> Result<TokenSource> {
	let token = cfg.access_token.trim();

	if !token.is_empty() {
		return TokenSource::fixed(token);
	}

	let Some(path) = cfg.service_account_path.as_deref().filter(|path| !path.trim().is_empty())
	else {
		return Err(Error::InvalidConfig(
			"Firestore needs a service account key or an access token.".to_string(),
		));
	};
	let key = ServiceAccountKey::from_file(Path::new(path.trim()))?;
	let tokens = ServiceAccountTokens::new(client.clone(), key)?;

	tracing::info!(client_email = tokens.client_email(), "Using service account for Firestore.");

	Ok(TokenSource::ServiceAccount(tokens))
}

/// Returns the final segment of a full document name.
pub fn document_key(name: &str) -> &str {
	name.rsplit('/').next().unwrap_or(name)
}

/// Converts a Firestore typed value (`{"stringValue": "..."}` and friends) to plain JSON.
pub fn decode_value(value: &Value) -> Value {
	let Some(object) = value.as_object() else {
		return Value::Null;
	};
	let Some((kind, inner)) = object.iter().next() else {
		return Value::Null;
	};

	match kind.as_str() {
		"nullValue" => Value::Null,
		"booleanValue" => inner.as_bool().map(Value::Bool).unwrap_or(Value::Null),
		// int64 travels as a decimal string.
		"integerValue" => match inner {
			Value::String(raw) =>
				raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| inner.clone()),
			_ => inner.clone(),
		},
		"doubleValue" => inner.clone(),
		"stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
		"arrayValue" => Value::Array(
			inner
				.get("values")
				.and_then(Value::as_array)
				.map(|values| values.iter().map(decode_value).collect())
				.unwrap_or_default(),
		),
		"mapValue" => Value::Object(
			inner
				.get("fields")
				.and_then(Value::as_object)
				.map(|fields| {
					fields.iter().map(|(name, value)| (name.clone(), decode_value(value))).collect()
				})
				.unwrap_or_default(),
		),
		"geoPointValue" => inner.clone(),
		_ => Value::Null,
	}
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => format!("{}...", &text[..idx]),
		None => text.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn test_config() -> mhike_config::Firestore {
		mhike_config::Firestore {
			api_base: "http://127.0.0.1:8080/v1".to_string(),
			project_id: "m-hike".to_string(),
			database: "(default)".to_string(),
			service_account_path: None,
			access_token: "owner".to_string(),
			page_size: 50,
			timeout_ms: None,
		}
	}

	#[test]
	fn decodes_scalar_values() {
		assert_eq!(decode_value(&serde_json::json!({ "stringValue": "Snowdon" })), "Snowdon");
		assert_eq!(decode_value(&serde_json::json!({ "integerValue": "42" })), 42);
		assert_eq!(decode_value(&serde_json::json!({ "doubleValue": 0.5 })), 0.5);
		assert_eq!(decode_value(&serde_json::json!({ "booleanValue": true })), true);
		assert_eq!(decode_value(&serde_json::json!({ "nullValue": null })), Value::Null);
		assert_eq!(decode_value(&serde_json::json!({ "unknownValue": 1 })), Value::Null);
	}

	#[test]
	fn decodes_nested_values() {
		let raw = serde_json::json!({
			"arrayValue": {
				"values": [
					{ "doubleValue": 0.1 },
					{ "integerValue": "2" },
					{ "mapValue": { "fields": { "k": { "stringValue": "v" } } } }
				]
			}
		});

		assert_eq!(decode_value(&raw), serde_json::json!([0.1, 2, { "k": "v" }]));
		assert_eq!(decode_value(&serde_json::json!({ "arrayValue": {} })), serde_json::json!([]));
	}

	#[test]
	fn extracts_document_key() {
		assert_eq!(
			document_key("projects/p/databases/(default)/documents/users/u1/hikes/17"),
			"17"
		);
		assert_eq!(document_key("17"), "17");
	}

	#[test]
	fn decodes_raw_document() {
		let raw: RawDocument = serde_json::from_value(serde_json::json!({
			"name": "projects/p/databases/(default)/documents/users/u1/hikes/3",
			"fields": {
				"name": { "stringValue": "Ridge walk" },
				"embedding_vector": { "arrayValue": { "values": [{ "doubleValue": 1.0 }] } }
			}
		}))
		.expect("raw document must parse");
		let document = raw.decode();

		assert_eq!(document.key, "3");
		assert_eq!(document.str_field("name"), Some("Ridge walk"));
		assert_eq!(document.field("embedding_vector"), Some(&serde_json::json!([1.0])));
	}

	#[test]
	fn builds_percent_encoded_collection_urls() {
		let store = FirestoreStore::new(&test_config()).expect("store must build");
		let url = store
			.collection_url(&[USERS_COLLECTION, "uid with space", HIKES_COLLECTION])
			.expect("url must build");

		assert_eq!(
			url.as_str(),
			"http://127.0.0.1:8080/v1/projects/m-hike/databases/(default)/documents/users/uid%20with%20space/hikes"
		);
	}

	#[test]
	fn rejects_relative_api_base() {
		let mut cfg = test_config();

		cfg.api_base = "firestore".to_string();

		assert!(matches!(FirestoreStore::new(&cfg), Err(Error::InvalidConfig(_))));
	}

	#[test]
	fn requires_a_credential() {
		let mut cfg = test_config();

		cfg.access_token = " ".to_string();

		assert!(matches!(FirestoreStore::new(&cfg), Err(Error::InvalidConfig(_))));

		cfg.service_account_path = Some("/nonexistent/mhike-service-account.json".to_string());

		assert!(matches!(FirestoreStore::new(&cfg), Err(Error::Credentials(_))));
	}
}
