use std::collections::BTreeMap;

use serde::Serialize;

use counsel_domain::{decision::Verdict, gate::Trigger, hit::Hit, query::{FilterExpr, Query}};

/// Instrumented record of one pipeline run. Stage records are absent when the stage did not run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
	pub mode: String,
	pub mode_label: String,
	pub case_id: String,
	pub utterance: String,
	pub trigger: Trigger,
	pub query: Option<Query>,
	pub embedding: Option<EmbeddingStage>,
	pub search: Option<SearchStage>,
	pub fusion: Option<FusionStage>,
	pub verdict: Verdict,
	pub timings: StageTimings,
	/// The embedding backend failed and the simulated embedder stood in for it.
	pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingStage {
	pub model: String,
	pub dimension: usize,
	pub elapsed_ms: f64,
	pub sparse_terms: Option<BTreeMap<String, f32>>,
	pub sparse_model: Option<&'static str>,
	pub simulated: bool,
	pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStage {
	pub collection: String,
	pub limit: u32,
	pub predicate: Option<FilterExpr>,
	pub dense_hits: usize,
	pub sparse_hits: Option<usize>,
	pub elapsed_ms: f64,
	pub degraded: bool,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
	Dense,
	Rrf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionStage {
	pub method: FusionMethod,
	pub rrf_k: f64,
	pub top_k: u32,
	pub hits: Vec<Hit>,
	pub elapsed_ms: f64,
}

/// Milliseconds per stage. `total_ms` is measured entry to exit, counting a simulated embedding
/// at its reported latency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
	pub gate_ms: f64,
	pub query_ms: f64,
	pub embed_ms: f64,
	pub search_ms: f64,
	pub fusion_ms: f64,
	pub decide_ms: f64,
	pub total_ms: f64,
}

impl Trace {
	/// Copy with every timing zeroed, for comparing replays.
	pub fn without_timings(&self) -> Self {
		let mut trace = self.clone();

		trace.timings = StageTimings::default();

		if let Some(embedding) = trace.embedding.as_mut() {
			embedding.elapsed_ms = 0.0;
		}
		if let Some(search) = trace.search.as_mut() {
			search.elapsed_ms = 0.0;
		}
		if let Some(fusion) = trace.fusion.as_mut() {
			fusion.elapsed_ms = 0.0;
		}

		trace
	}
}
