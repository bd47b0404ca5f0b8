use std::time::Duration;

use serde::Deserialize;
use tokio::time::{self, Instant};

use crate::{
	Error, ModeAdapters, PipelineService, Result,
	trace::{EmbeddingStage, FusionMethod, FusionStage, SearchStage, StageTimings, Trace},
};
use counsel_domain::{cases::CaseContext, fusion, gate, lexical, query};
use counsel_storage::{SearchHits, SearchRequest};

#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
	pub utterance_text: String,
	#[serde(default)]
	pub case_id: String,
	pub mode: String,
	#[serde(default)]
	pub hybrid: Option<bool>,
}

struct EmbeddingOutcome {
	vector: Vec<f32>,
	stage: EmbeddingStage,
	/// Time actually spent waiting on the adapter, even when the reported time is simulated.
	measured_ms: f64,
}

impl PipelineService {
	pub async fn run(&self, req: &RunRequest) -> Result<Trace> {
		let lane = self.mode(&req.mode)?;
		let case = self.resolve_case(&req.case_id);
		let hybrid = req.hybrid.unwrap_or(self.cfg.pipeline.hybrid);

		Ok(self.run_mode(lane, &req.utterance_text, &case, hybrid).await)
	}

	/// Runs every stage for one utterance on one lane. Adapter failures degrade the trace.
	pub async fn run_mode(
		&self,
		lane: &ModeAdapters,
		text: &str,
		case: &CaseContext,
		hybrid: bool,
	) -> Trace {
		let started = Instant::now();
		let mut timings = StageTimings::default();
		let stage_started = Instant::now();
		let trigger = gate::evaluate(text);

		timings.gate_ms = elapsed_ms(stage_started);

		if trigger.is_ignored() {
			let verdict = self.engine.decide(&trigger, text, case, &[]);

			timings.total_ms = elapsed_ms(started);

			return Trace {
				mode: lane.name.clone(),
				mode_label: lane.label.clone(),
				case_id: case.id.clone(),
				utterance: text.to_string(),
				trigger,
				query: None,
				embedding: None,
				search: None,
				fusion: None,
				verdict,
				timings,
				fallback: false,
			};
		}

		let stage_started = Instant::now();
		let query = query::build(text, &trigger, case, self.engine.rules());

		timings.query_ms = elapsed_ms(stage_started);

		let embedding = self.embed_stage(lane, &query.text, hybrid).await;

		timings.embed_ms = embedding.stage.elapsed_ms;

		let request = SearchRequest {
			collection: lane.collection.clone(),
			dense: embedding.vector,
			sparse: embedding.stage.sparse_terms.clone(),
			limit: self.cfg.pipeline.search_limit,
			predicate: Some(query.predicate(&self.cfg.pipeline.universal_case)),
		};
		let (search, hits) = self.search_stage(lane, request).await;

		timings.search_ms = search.elapsed_ms;

		let stage_started = Instant::now();
		let fused = fusion::fuse(
			&hits.dense,
			hits.sparse.as_deref(),
			self.cfg.pipeline.top_k,
			self.cfg.pipeline.rrf_k,
		);

		timings.fusion_ms = elapsed_ms(stage_started);

		let stage_started = Instant::now();
		let verdict = self.engine.decide(&trigger, text, case, &fused);

		timings.decide_ms = elapsed_ms(stage_started);
		// A simulated embedding reports its documented latency in place of the time actually spent.
		timings.total_ms =
			(elapsed_ms(started) - embedding.measured_ms + embedding.stage.elapsed_ms).max(0.0);

		tracing::debug!(
			mode = %lane.name,
			case_id = %case.id,
			gate_ms = timings.gate_ms,
			query_ms = timings.query_ms,
			embed_ms = timings.embed_ms,
			search_ms = timings.search_ms,
			fusion_ms = timings.fusion_ms,
			decide_ms = timings.decide_ms,
			total_ms = timings.total_ms,
			"Pipeline run finished."
		);

		let fallback = embedding.stage.error.is_some();
		let fusion = FusionStage {
			method: if hits.sparse.is_some() { FusionMethod::Rrf } else { FusionMethod::Dense },
			rrf_k: self.cfg.pipeline.rrf_k,
			top_k: self.cfg.pipeline.top_k,
			hits: fused,
			elapsed_ms: timings.fusion_ms,
		};

		Trace {
			mode: lane.name.clone(),
			mode_label: lane.label.clone(),
			case_id: case.id.clone(),
			utterance: text.to_string(),
			trigger,
			query: Some(query),
			embedding: Some(embedding.stage),
			search: Some(search),
			fusion: Some(fusion),
			verdict,
			timings,
			fallback,
		}
	}

	async fn embed_stage(&self, lane: &ModeAdapters, text: &str, hybrid: bool) -> EmbeddingOutcome {
		let sparse_terms = hybrid.then(|| lexical::sparse_terms(text));
		let sparse_model = hybrid.then_some(lexical::SPARSE_MODEL);
		let started = Instant::now();
		let result = bounded("embedding", lane.embed_timeout, lane.embedder.embed(text)).await;
		let measured_ms = elapsed_ms(started);
		let result = result.and_then(|embedding| {
			if embedding.vector.len() != lane.dimensions as usize {
				return Err(Error::EmbeddingUnavailable {
					message: format!(
						"Embedding has {} dimensions, expected {}.",
						embedding.vector.len(),
						lane.dimensions
					),
				});
			}

			Ok(embedding)
		});

		match result {
			Ok(embedding) => {
				let simulated = lane.embedder.is_simulated();
				let elapsed_ms =
					if simulated { lane.simulated.latency_ms() as f64 } else { measured_ms };

				EmbeddingOutcome {
					stage: EmbeddingStage {
						model: embedding.model,
						dimension: embedding.vector.len(),
						elapsed_ms,
						sparse_terms,
						sparse_model,
						simulated,
						error: None,
					},
					vector: embedding.vector,
					measured_ms,
				}
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					mode = %lane.name,
					"Embedding backend failed. Using simulated embedding."
				);

				let embedding = lane.simulated.embed(text);

				EmbeddingOutcome {
					stage: EmbeddingStage {
						model: embedding.model,
						dimension: embedding.vector.len(),
						elapsed_ms: lane.simulated.latency_ms() as f64,
						sparse_terms,
						sparse_model,
						simulated: true,
						error: Some(err.to_string()),
					},
					vector: embedding.vector,
					measured_ms,
				}
			},
		}
	}

	async fn search_stage(&self, lane: &ModeAdapters, request: SearchRequest) -> (SearchStage, SearchHits) {
		let started = Instant::now();
		let result = bounded("search", self.search_timeout, lane.search.search(&request)).await;
		let elapsed_ms = elapsed_ms(started);
		let (hits, error) = match result {
			Ok(hits) => (hits, None),
			Err(err) => {
				tracing::warn!(
					error = %err,
					mode = %lane.name,
					collection = %request.collection,
					"Search failed. Continuing without evidence."
				);

				(SearchHits::default(), Some(err.to_string()))
			},
		};
		let stage = SearchStage {
			collection: request.collection,
			limit: request.limit,
			predicate: request.predicate,
			dense_hits: hits.dense.len(),
			sparse_hits: hits.sparse.as_ref().map(Vec::len),
			elapsed_ms,
			degraded: error.is_some(),
			error,
		};

		(stage, hits)
	}
}

pub(crate) fn elapsed_ms(started: Instant) -> f64 {
	started.elapsed().as_secs_f64() * 1_000.0
}

async fn bounded<T>(
	stage: &'static str,
	limit: Duration,
	fut: impl Future<Output = Result<T>>,
) -> Result<T> {
	match time::timeout(limit, fut).await {
		Ok(result) => result,
		Err(_) => Err(Error::Timeout { stage, timeout_ms: limit.as_millis() as u64 }),
	}
}
