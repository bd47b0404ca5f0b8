use std::{
	collections::BTreeMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use counsel_config::Config;
use counsel_domain::{
	decision::{Decision, VerdictBasis},
	gate::TriggerAction,
	hit::{DocType, ScoredHit},
	objection::ObjectionType,
};
use counsel_providers::{embedding::DenseEmbedding, simulated::SimulatedEmbedder};
use counsel_service::{
	BoxFuture, CompareRequest, EmbeddingProvider, Error, FusionMethod, Lane, ModeAdapters,
	PipelineService, Result, RunRequest, SearchProvider,
};
use counsel_storage::{
	SearchHits, SearchRequest,
	memory::{CorpusDocument, InMemoryIndex},
};

const TEST_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"

[storage.qdrant]
url        = "http://127.0.0.1:6334"
collection = "legal_memory"
vector_dim = 4
timeout_ms = 500

[modes.qdrant]
label               = "Qdrant Cloud Inference"
api_style           = "openai"
api_base            = "http://127.0.0.1:9"
api_key             = "test-key"
path                = "/v1/embeddings"
model               = "test-embed"
dimensions          = 4
timeout_ms          = 200
fallback_latency_ms = 45

[modes.jina]
label               = "Jina API (Network)"
api_style           = "openai"
api_base            = "http://127.0.0.1:9"
api_key             = "test-key"
path                = "/v1/embeddings"
model               = "test-embed"
dimensions          = 4
timeout_ms          = 200
fallback_latency_ms = 120

[compare]
mode_a = "qdrant"
mode_b = "jina"
"#;

struct FixedEmbedding {
	vector: Vec<f32>,
	delay: Duration,
}
impl FixedEmbedding {
	fn new(vector: Vec<f32>) -> Self {
		Self { vector, delay: Duration::ZERO }
	}

	fn delayed(vector: Vec<f32>, delay: Duration) -> Self {
		Self { vector, delay }
	}
}
impl EmbeddingProvider for FixedEmbedding {
	fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<DenseEmbedding>> {
		Box::pin(async move {
			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			Ok(DenseEmbedding { vector: self.vector.clone(), model: "test-embed".to_string() })
		})
	}
}

struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<DenseEmbedding>> {
		Box::pin(async move {
			Err(Error::EmbeddingUnavailable { message: "connection refused".to_string() })
		})
	}
}

struct StaticSearch {
	hits: SearchHits,
	calls: Arc<AtomicUsize>,
}
impl StaticSearch {
	fn new(hits: SearchHits) -> Self {
		Self { hits, calls: Arc::new(AtomicUsize::new(0)) }
	}
}
impl SearchProvider for StaticSearch {
	fn search<'a>(&'a self, _req: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let hits = self.hits.clone();

		Box::pin(async move { Ok(hits) })
	}
}

struct FailingSearch;
impl SearchProvider for FailingSearch {
	fn search<'a>(&'a self, _req: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		Box::pin(async move {
			Err(Error::SearchUnavailable { message: "qdrant is down".to_string() })
		})
	}
}

struct HangingSearch;
impl SearchProvider for HangingSearch {
	fn search<'a>(&'a self, _req: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		Box::pin(std::future::pending())
	}
}

fn test_config() -> Config {
	toml::from_str(TEST_CONFIG_TOML).expect("Failed to parse test config.")
}

fn lane(
	cfg: &Config,
	name: &str,
	embedder: Arc<dyn EmbeddingProvider>,
	search: Arc<dyn SearchProvider>,
) -> ModeAdapters {
	ModeAdapters::new(name, &cfg.modes[name], cfg, embedder, search)
}

fn service_with(
	embedder: Arc<dyn EmbeddingProvider>,
	search: Arc<dyn SearchProvider>,
) -> PipelineService {
	let cfg = test_config();
	let mut modes = BTreeMap::new();

	for name in ["qdrant", "jina"] {
		modes.insert(name.to_string(), lane(&cfg, name, embedder.clone(), search.clone()));
	}

	PipelineService::with_modes(cfg, modes).expect("Failed to build service.")
}

fn evidence_hit(id: &str, score: f32) -> ScoredHit {
	ScoredHit {
		id: id.to_string(),
		collection_name: "legal_memory".to_string(),
		title: "DX 1234".to_string(),
		snippet: "Internal email discussing browser share.".to_string(),
		doc_type: DocType::Evidence,
		objection_type: None,
		score,
	}
}

fn run_request(text: &str) -> RunRequest {
	RunRequest {
		utterance_text: text.to_string(),
		case_id: "msft".to_string(),
		mode: "qdrant".to_string(),
		hybrid: None,
	}
}

fn hearsay_rule() -> CorpusDocument {
	CorpusDocument {
		id: "fre-802".to_string(),
		text: "Hearsay is not admissible unless a federal statute or these rules provide otherwise."
			.to_string(),
		source: "Federal Rules of Evidence 802".to_string(),
		doc_type: "RULE".to_string(),
		case_id: "universal".to_string(),
		objection_type: Some("HEARSAY".to_string()),
		keywords: Some("hearsay out-of-court statement".to_string()),
	}
}

#[tokio::test(start_paused = true)]
async fn short_utterance_skips_every_downstream_stage() {
	let search = Arc::new(StaticSearch::new(SearchHits::default()));
	let calls = search.calls.clone();
	let service = service_with(Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])), search);
	let trace = service.run(&run_request("Yes.")).await.expect("Run failed.");

	assert_eq!(trace.trigger.action, TriggerAction::Ignore);
	assert_eq!(trace.verdict.decision, Decision::NoAction);
	assert_eq!(trace.verdict.basis, VerdictBasis::Skipped);
	assert!(trace.query.is_none());
	assert!(trace.embedding.is_none());
	assert!(trace.search.is_none());
	assert!(trace.fusion.is_none());
	assert_eq!(trace.timings.embed_ms, 0.0);
	assert_eq!(trace.timings.search_ms, 0.0);
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn hot_phrase_produces_actionable_verdict() {
	let hits = SearchHits { dense: vec![evidence_hit("dx-1", 0.41)], sparse: None };
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(StaticSearch::new(hits)),
	);
	let text = "Isn't it true you wanted to kill Netscape?";
	let trace = service.run(&run_request(text)).await.expect("Run failed.");
	let query = trace.query.as_ref().expect("Query stage must run.");

	assert!(query.rewritten);
	assert!(query.text.contains("monopoly intent"));
	assert_eq!(trace.verdict.decision, Decision::Actionable);
	assert_eq!(trace.verdict.objection_type, Some(ObjectionType::AssumesFacts));
	assert_eq!(trace.verdict.score, 92);
	assert_eq!(trace.verdict.basis, VerdictBasis::HotPhrase);
	assert_eq!(trace.verdict.supporting_hit_ids, vec!["dx-1".to_string()]);
	assert!(!trace.fallback);
}

#[tokio::test(start_paused = true)]
async fn retrieved_rule_drives_the_verdict() {
	let cfg = test_config();
	let mut index = InMemoryIndex::new();

	index.insert("legal_memory", hearsay_rule(), vec![1.0, 0.0, 0.0, 0.0]);

	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(index),
	);
	let text = "The engineer told me the executives already agreed on it.";
	let trace = service.run(&run_request(text)).await.expect("Run failed.");
	let fusion = trace.fusion.as_ref().expect("Fusion stage must run.");

	assert_eq!(cfg.pipeline.top_k, fusion.top_k);
	assert_eq!(fusion.method, FusionMethod::Dense);
	assert_eq!(fusion.hits[0].id, "fre-802");
	assert_eq!(trace.verdict.decision, Decision::Actionable);
	assert_eq!(trace.verdict.objection_type, Some(ObjectionType::Hearsay));
	assert_eq!(trace.verdict.basis, VerdictBasis::RetrievedEvidence);
	assert_eq!(trace.verdict.supporting_hit_ids, vec!["fre-802".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn hybrid_run_reports_sparse_terms_and_fuses_with_rrf() {
	let mut index = InMemoryIndex::new();

	index.insert("legal_memory", hearsay_rule(), vec![1.0, 0.0, 0.0, 0.0]);

	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(index),
	);
	let mut request = run_request("Objection, that statement is hearsay.");

	request.hybrid = Some(true);

	let trace = service.run(&request).await.expect("Run failed.");
	let embedding = trace.embedding.as_ref().expect("Embedding stage must run.");
	let search = trace.search.as_ref().expect("Search stage must run.");
	let fusion = trace.fusion.as_ref().expect("Fusion stage must run.");

	assert!(embedding.sparse_terms.as_ref().is_some_and(|terms| terms.contains_key("hearsay")));
	assert_eq!(embedding.sparse_model, Some("bm25-tf"));
	assert_eq!(search.sparse_hits, Some(1));
	assert_eq!(fusion.method, FusionMethod::Rrf);
	assert_eq!(fusion.hits[0].dense_rank, Some(1));
	assert_eq!(fusion.hits[0].sparse_rank, Some(1));
}

#[tokio::test(start_paused = true)]
async fn search_failure_degrades_to_insufficient_evidence() {
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(FailingSearch),
	);
	let text = "Isn't it true you wanted to kill Netscape?";
	let trace = service.run(&run_request(text)).await.expect("Run must not fail.");
	let search = trace.search.as_ref().expect("Search stage must run.");

	assert!(search.degraded);
	assert!(search.error.as_deref().is_some_and(|err| err.contains("qdrant is down")));
	assert_eq!(trace.verdict.decision, Decision::NoAction);
	assert_eq!(trace.verdict.basis, VerdictBasis::InsufficientEvidence);
}

#[tokio::test(start_paused = true)]
async fn hanging_search_times_out() {
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(HangingSearch),
	);
	let trace = service
		.run(&run_request("Mr. Gates, did you attend that meeting?"))
		.await
		.expect("Run must not fail.");
	let search = trace.search.as_ref().expect("Search stage must run.");

	assert!(search.degraded);
	assert_eq!(search.error.as_deref(), Some("search timed out after 500 ms."));
	assert!((500.0..=501.0).contains(&search.elapsed_ms));
	assert_eq!(trace.verdict.basis, VerdictBasis::InsufficientEvidence);
}

#[tokio::test(start_paused = true)]
async fn embedding_failure_falls_back_to_simulated_latency() {
	let hits = SearchHits { dense: vec![evidence_hit("dx-1", 0.41)], sparse: None };
	let service = service_with(Arc::new(FailingEmbedding), Arc::new(StaticSearch::new(hits)));
	let trace = service
		.run(&run_request("Mr. Gates, did you attend that meeting?"))
		.await
		.expect("Run must not fail.");
	let embedding = trace.embedding.as_ref().expect("Embedding stage must run.");

	assert!(trace.fallback);
	assert!(embedding.simulated);
	assert_eq!(embedding.model, "simulated/test-embed");
	assert_eq!(embedding.dimension, 4);
	assert!(embedding.error.as_deref().is_some_and(|err| err.contains("connection refused")));
	assert_eq!(trace.timings.embed_ms, 45.0);
	assert_eq!(trace.timings.total_ms, 45.0);
}

#[tokio::test(start_paused = true)]
async fn simulated_primary_embedder_reports_its_documented_latency() {
	let cfg = test_config();
	let service = service_with(
		Arc::new(SimulatedEmbedder::from_mode(&cfg.modes["qdrant"])),
		Arc::new(StaticSearch::new(SearchHits::default())),
	);
	let trace = service
		.run(&run_request("Mr. Gates, did you attend that meeting?"))
		.await
		.expect("Run must not fail.");
	let embedding = trace.embedding.as_ref().expect("Embedding stage must run.");

	assert!(!trace.fallback);
	assert!(embedding.simulated);
	assert!(embedding.error.is_none());
	assert_eq!(trace.timings.embed_ms, 45.0);
	assert_eq!(trace.timings.total_ms, 45.0);
}

#[tokio::test(start_paused = true)]
async fn wrong_dimension_embedding_falls_back() {
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0])),
		Arc::new(StaticSearch::new(SearchHits::default())),
	);
	let trace = service
		.run(&run_request("Mr. Gates, did you attend that meeting?"))
		.await
		.expect("Run must not fail.");
	let embedding = trace.embedding.as_ref().expect("Embedding stage must run.");

	assert!(trace.fallback);
	assert_eq!(embedding.dimension, 4);
	assert!(embedding.error.as_deref().is_some_and(|err| err.contains("expected 4")));
}

#[tokio::test(start_paused = true)]
async fn replay_is_deterministic_apart_from_timings() {
	let hits = SearchHits {
		dense: vec![evidence_hit("dx-1", 0.41), evidence_hit("dx-2", 0.39)],
		sparse: None,
	};
	let service = service_with(Arc::new(FailingEmbedding), Arc::new(StaticSearch::new(hits)));
	let request = run_request("Mr. Gates, did you attend that meeting?");
	let first = service.run(&request).await.expect("Run failed.");
	let second = service.run(&request).await.expect("Run failed.");

	assert_eq!(first.without_timings(), second.without_timings());
	assert_eq!(first.verdict.basis, VerdictBasis::Monitor);
	assert!((10..=40).contains(&first.verdict.score));
}

#[tokio::test(start_paused = true)]
async fn blank_case_id_uses_the_default_case() {
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(StaticSearch::new(SearchHits::default())),
	);
	let mut request = run_request("Mr. Gates, did you attend that meeting?");

	request.case_id = "  ".to_string();

	let trace = service.run(&request).await.expect("Run failed.");

	assert_eq!(trace.case_id, "msft");
}

#[tokio::test(start_paused = true)]
async fn unknown_mode_is_rejected() {
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(StaticSearch::new(SearchHits::default())),
	);
	let mut request = run_request("Mr. Gates, did you attend that meeting?");

	request.mode = "hf".to_string();

	let err = service.run(&request).await.expect_err("Expected unknown mode.");

	assert!(matches!(err, Error::UnknownMode { mode } if mode == "hf"));
}

#[tokio::test(start_paused = true)]
async fn identical_lanes_compare_evenly() {
	let hits = SearchHits { dense: vec![evidence_hit("dx-1", 0.41)], sparse: None };
	let service = service_with(
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0])),
		Arc::new(StaticSearch::new(hits)),
	);
	let request = CompareRequest {
		utterance_text: "Isn't it true you wanted to kill Netscape?".to_string(),
		case_id: "msft".to_string(),
		mode_a: None,
		mode_b: None,
		hybrid: None,
		session_id: None,
	};
	let comparison = service.compare(&request).await.expect("Compare failed.");

	assert_eq!(comparison.trace_a.mode, "qdrant");
	assert_eq!(comparison.trace_b.mode, "jina");
	assert_eq!(comparison.delta_total_ms, 0.0);
	assert_eq!(comparison.faster, Lane::A);
	assert!(comparison.verdicts_agree());
	assert_eq!(comparison.trace_a.query, comparison.trace_b.query);
}

#[tokio::test(start_paused = true)]
async fn slower_lane_loses_the_comparison() {
	let cfg = test_config();
	let search: Arc<dyn SearchProvider> = Arc::new(StaticSearch::new(SearchHits::default()));
	let mut modes = BTreeMap::new();

	modes.insert(
		"qdrant".to_string(),
		lane(
			&cfg,
			"qdrant",
			Arc::new(FixedEmbedding::delayed(vec![1.0, 0.0, 0.0, 0.0], Duration::from_millis(80))),
			search.clone(),
		),
	);
	modes.insert(
		"jina".to_string(),
		lane(
			&cfg,
			"jina",
			Arc::new(FixedEmbedding::delayed(vec![1.0, 0.0, 0.0, 0.0], Duration::from_millis(20))),
			search,
		),
	);

	let service = PipelineService::with_modes(cfg, modes).expect("Failed to build service.");
	let request = CompareRequest {
		utterance_text: "Mr. Gates, did you attend that meeting?".to_string(),
		case_id: "msft".to_string(),
		mode_a: None,
		mode_b: None,
		hybrid: None,
		session_id: None,
	};
	let comparison = service.compare(&request).await.expect("Compare failed.");

	assert!((80.0..=81.0).contains(&comparison.trace_a.timings.embed_ms));
	assert!((20.0..=21.0).contains(&comparison.trace_b.timings.embed_ms));
	assert!(comparison.delta_embed_ms > 58.0);
	assert!(comparison.delta_total_ms > 58.0);
	assert_eq!(comparison.faster, Lane::B);
}

#[tokio::test(start_paused = true)]
async fn comparison_lanes_run_concurrently() {
	let service = service_with(
		Arc::new(FixedEmbedding::delayed(vec![1.0, 0.0, 0.0, 0.0], Duration::from_millis(80))),
		Arc::new(StaticSearch::new(SearchHits::default())),
	);
	let request = CompareRequest {
		utterance_text: "Mr. Gates, did you attend that meeting?".to_string(),
		case_id: "msft".to_string(),
		mode_a: None,
		mode_b: None,
		hybrid: None,
		session_id: None,
	};
	let started = tokio::time::Instant::now();
	let comparison = service.compare(&request).await.expect("Compare failed.");
	let elapsed = started.elapsed();

	assert!(elapsed >= Duration::from_millis(80));
	assert!(elapsed < Duration::from_millis(120), "lanes ran sequentially: {elapsed:?}");
	assert!(comparison.trace_a.timings.embed_ms >= 80.0);
	assert!(comparison.trace_b.timings.embed_ms >= 80.0);
}

#[test]
fn compare_modes_need_adapters() {
	let cfg = test_config();
	let embedder: Arc<dyn EmbeddingProvider> =
		Arc::new(FixedEmbedding::new(vec![1.0, 0.0, 0.0, 0.0]));
	let search: Arc<dyn SearchProvider> = Arc::new(FailingSearch);
	let mut modes = BTreeMap::new();

	modes.insert("qdrant".to_string(), lane(&cfg, "qdrant", embedder, search));

	let err = PipelineService::with_modes(cfg, modes).err().expect("Expected configuration error.");

	assert!(matches!(err, Error::Configuration { .. }));
}
