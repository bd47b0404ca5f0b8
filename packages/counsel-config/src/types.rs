use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub pipeline: Pipeline,
	/// Embedding backends keyed by mode name, e.g. "qdrant", "jina", "local".
	pub modes: BTreeMap<String, ModeConfig>,
	pub compare: Compare,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	#[serde(default)]
	pub api_key: Option<String>,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_search_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	/// Size of the decision-facing evidence panel.
	pub top_k: u32,
	/// Candidates requested from each search leg before fusion.
	pub search_limit: u32,
	pub hybrid: bool,
	pub rrf_k: f64,
	/// Verdicts are actionable only when the score is strictly greater than this value.
	pub decision_threshold: u8,
	/// Retrieved evidence below this raw similarity never drives a verdict.
	pub evidence_min_score: f32,
	pub default_case: String,
	pub universal_case: String,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self {
			top_k: 3,
			search_limit: 10,
			hybrid: false,
			rrf_k: 60.0,
			decision_threshold: 85,
			evidence_min_score: 0.65,
			default_case: "msft".to_string(),
			universal_case: "universal".to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
	/// `POST {api_base}{path}` with `{model, input: [..]}` returning `data[].embedding`.
	Openai,
	/// FastEmbed sidecar: `POST {api_base}{path}` with `{text, model}` returning `embedding`.
	Fastembed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
	pub label: String,
	pub api_style: ApiStyle,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	/// Latency reported for the simulated embedding used when this backend is unavailable.
	pub fallback_latency_ms: u64,
	/// Optional per-mode collection; defaults to `storage.qdrant.collection`.
	#[serde(default)]
	pub collection: Option<String>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Compare {
	pub mode_a: String,
	pub mode_b: String,
}

fn default_search_timeout_ms() -> u64 {
	3_000
}
