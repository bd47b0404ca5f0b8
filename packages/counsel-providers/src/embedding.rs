use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};
use counsel_config::{ApiStyle, ModeConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseEmbedding {
	pub vector: Vec<f32>,
	pub model: String,
}

/// HTTP embedding client for one configured mode. Built once and shared across requests.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
	style: ApiStyle,
	url: String,
	model: String,
	client: Client,
}
impl HttpEmbedder {
	pub fn new(cfg: &ModeConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.build()?;

		Ok(Self {
			style: cfg.api_style,
			url: format!("{}{}", cfg.api_base, cfg.path),
			model: cfg.model.clone(),
			client,
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub async fn embed(&self, text: &str) -> Result<DenseEmbedding> {
		let body = match self.style {
			ApiStyle::Openai => serde_json::json!({
				"model": self.model,
				"input": [text],
			}),
			ApiStyle::Fastembed => serde_json::json!({
				"text": text,
				"model": self.model,
			}),
		};
		let res = self.client.post(&self.url).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		match self.style {
			ApiStyle::Openai => {
				let vector = parse_openai_response(json)?.into_iter().next().ok_or_else(|| {
					Error::InvalidResponse {
						message: "Embedding response contained no vectors.".to_string(),
					}
				})?;

				Ok(DenseEmbedding { vector, model: self.model.clone() })
			},
			ApiStyle::Fastembed => parse_fastembed_response(json, &self.model),
		}
	}
}

fn parse_openai_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);

		indexed.push((index, parse_vector(item.get("embedding"))?));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

fn parse_fastembed_response(json: Value, fallback_model: &str) -> Result<DenseEmbedding> {
	let vector = parse_vector(json.get("embedding"))?;
	let model = json
		.get("model")
		.and_then(|v| v.as_str())
		.filter(|model| !model.is_empty())
		.unwrap_or(fallback_model)
		.to_string();

	Ok(DenseEmbedding { vector, model })
}

fn parse_vector(value: Option<&Value>) -> Result<Vec<f32>> {
	let embedding = value.and_then(|v| v.as_array()).ok_or_else(|| Error::InvalidResponse {
		message: "Embedding item missing embedding array.".to_string(),
	})?;
	let mut vec = Vec::with_capacity(embedding.len());

	for value in embedding {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vec.push(number as f32);
	}

	Ok(vec)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_openai_response(json).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn fastembed_response_falls_back_to_configured_model() {
		let json = serde_json::json!({ "embedding": [0.25, -0.5], "dimension": 2, "timingMs": 3 });
		let parsed = parse_fastembed_response(json, "jinaai/jina-embeddings-v2-base-en")
			.expect("parse failed");

		assert_eq!(parsed.vector, vec![0.25, -0.5]);
		assert_eq!(parsed.model, "jinaai/jina-embeddings-v2-base-en");
	}

	#[test]
	fn non_numeric_values_are_rejected() {
		let json = serde_json::json!({ "data": [{ "embedding": [0.1, "x"] }] });
		let err = parse_openai_response(json).expect_err("Expected parse failure.");

		assert!(err.to_string().contains("must be numeric"));
	}
}
