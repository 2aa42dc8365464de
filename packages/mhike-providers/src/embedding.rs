use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

const MODEL_PREFIX: &str = "models/";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Embeds a single text with one `embedContent` call. No retry.
pub async fn embed(
	client: &Client,
	cfg: &mhike_config::EmbeddingProviderConfig,
	text: &str,
) -> Result<Vec<f32>> {
	let model = model_name(&cfg.model);
	let url = format!("{}/{model}:embedContent", cfg.api_base);
	let body = build_request_body(&model, text);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let detail = res.text().await.unwrap_or_default();

		tracing::warn!(
			%status,
			provider_id = %cfg.provider_id,
			"Embedding provider returned an error status."
		);

		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding provider returned {status}: {}",
				truncate(&detail, MAX_ERROR_BODY_CHARS)
			),
		});
	}

	let json: Value = res.json().await?;

	parse_embedding_response(&json)
}

pub fn model_name(model: &str) -> String {
	let model = model.trim();

	if model.starts_with(MODEL_PREFIX) {
		model.to_string()
	} else {
		format!("{MODEL_PREFIX}{model}")
	}
}

pub fn build_request_body(model: &str, text: &str) -> Value {
	serde_json::json!({
		"model": model,
		"content": {
			"parts": [{ "text": text }],
		},
	})
}

pub fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
	let values = json
		.get("embedding")
		.and_then(|embedding| embedding.get("values"))
		.and_then(|values| values.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: format!(
				"Unexpected embedding response format: {}",
				truncate(&json.to_string(), MAX_ERROR_BODY_CHARS)
			),
		})?;

	if values.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Embedding response contains an empty vector.".to_string(),
		});
	}

	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	Ok(vec)
}

fn truncate(text: &str, max_chars: usize) -> String {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => format!("{}...", &text[..idx]),
		None => text.to_string(),
	}
}
