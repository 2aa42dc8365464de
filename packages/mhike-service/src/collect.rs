use serde_json::Value;

use mhike_storage::{
	DocumentStore,
	models::{
		COMMENTS_FIELD, DESCRIPTION_FIELD, Document, EMBEDDING_FIELD, LOCATION_FIELD, NAME_FIELD,
		OBSERVATION_TEXT_FIELD,
	},
};

use crate::{
	Result,
	candidate::{CandidateItem, CandidateKind, SearchScope},
};

/// Reads the owner's hike tree and keeps every document that carries an embedding.
///
/// Hikes come first, then observations grouped by their hike, each in store order. Observations
/// are read under every listed hike, embedded or not.
pub async fn collect_candidates(
	store: &dyn DocumentStore,
	owner_id: &str,
	scope: SearchScope,
) -> Result<Vec<CandidateItem>> {
	let hikes = store.list_hikes(owner_id).await?;
	let mut candidates = Vec::new();

	if scope.includes_hikes() {
		candidates.extend(hikes.iter().filter_map(hike_candidate));
	}
	if scope.includes_observations() {
		for hike in &hikes {
			let observations = store.list_observations(owner_id, &hike.key).await?;

			candidates.extend(
				observations
					.iter()
					.filter_map(|document| observation_candidate(document, &hike.key)),
			);
		}
	}

	tracing::debug!(
		owner_id,
		scope = scope.as_str(),
		hikes = hikes.len(),
		candidates = candidates.len(),
		"Collected search candidates."
	);

	Ok(candidates)
}

pub fn hike_candidate(document: &Document) -> Option<CandidateItem> {
	let embedding = embedding_field(document)?;

	Some(CandidateItem {
		id: document.key.clone(),
		hike_id: parse_numeric_id(&document.key),
		embedding,
		kind: CandidateKind::Hike {
			name: text_field(document, NAME_FIELD),
			location: text_field(document, LOCATION_FIELD),
			description: text_field(document, DESCRIPTION_FIELD),
		},
	})
}

pub fn observation_candidate(document: &Document, hike_key: &str) -> Option<CandidateItem> {
	let embedding = embedding_field(document)?;

	Some(CandidateItem {
		id: document.key.clone(),
		hike_id: parse_numeric_id(hike_key),
		embedding,
		kind: CandidateKind::Observation {
			observation_text: text_field(document, OBSERVATION_TEXT_FIELD),
			comments: text_field(document, COMMENTS_FIELD),
			location: text_field(document, LOCATION_FIELD),
		},
	})
}

/// Parses a document key made only of ASCII digits.
pub fn parse_numeric_id(key: &str) -> Option<i64> {
	if key.is_empty() || !key.bytes().all(|byte| byte.is_ascii_digit()) {
		return None;
	}

	key.parse().ok()
}

/// Returns the stored embedding, or `None` when the field is absent or unusable.
pub fn embedding_field(document: &Document) -> Option<Vec<f32>> {
	let values = match document.field(EMBEDDING_FIELD)? {
		Value::Array(values) => values,
		Value::Null => return None,
		_ => {
			tracing::warn!(document = %document.key, "Embedding field is not an array; skipping.");

			return None;
		},
	};

	if values.is_empty() {
		return None;
	}

	let mut embedding = Vec::with_capacity(values.len());

	for value in values {
		let Some(number) = value.as_f64() else {
			tracing::warn!(
				document = %document.key,
				"Embedding field contains a non-numeric value; skipping."
			);

			return None;
		};

		embedding.push(number as f32);
	}

	Some(embedding)
}

fn text_field(document: &Document, name: &str) -> String {
	document.str_field(name).unwrap_or_default().to_string()
}
