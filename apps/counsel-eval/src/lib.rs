use std::{collections::BTreeMap, fs, path::{Path, PathBuf}, sync::Arc};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;

use counsel_config::Config;
use counsel_domain::{decision::Decision, objection::ObjectionType};
use counsel_providers::simulated::SimulatedEmbedder;
use counsel_service::{CompareRequest, Comparison, Lane, ModeAdapters, PipelineService, Trace};
use counsel_storage::memory::{CorpusDocument, InMemoryIndex};

#[derive(Debug, Parser)]
#[command(
	version = counsel_cli::VERSION,
	rename_all = "kebab",
	styles = counsel_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Case whose script is replayed; defaults to `pipeline.default_case`.
	#[arg(long, value_name = "ID")]
	pub case: Option<String>,
	#[arg(long, value_name = "MODE")]
	pub mode_a: Option<String>,
	#[arg(long, value_name = "MODE")]
	pub mode_b: Option<String>,
	/// JSON array of corpus documents. Replays offline against an in-memory index with simulated
	/// embeddings instead of the configured backends.
	#[arg(long, value_name = "FILE")]
	pub corpus: Option<PathBuf>,
	#[arg(long)]
	pub hybrid: bool,
	#[arg(long, value_name = "N", default_value_t = 1)]
	pub runs: u32,
}

#[derive(Debug, Serialize)]
struct ReplayOutput {
	case_id: String,
	mode_a: String,
	mode_b: String,
	/// Offline lanes embed with the simulated embedder, so their embedding latencies are the
	/// configured `fallback_latency_ms` values rather than measurements.
	offline: bool,
	hybrid: bool,
	runs: u32,
	summary_a: LaneSummary,
	summary_b: LaneSummary,
	wins_a: usize,
	wins_b: usize,
	verdict_agreement: f64,
	utterances: Vec<UtteranceReport>,
}

#[derive(Debug, Serialize, PartialEq)]
struct LaneSummary {
	total_ms_p50: f64,
	total_ms_p95: f64,
	embed_ms_p50: f64,
	embed_ms_p95: f64,
	actionable: usize,
	fallbacks: usize,
	/// Runs whose embedding latency is simulated, offline lanes and fallbacks alike.
	simulated_embeddings: usize,
	degraded_searches: usize,
}

#[derive(Debug, Serialize)]
struct UtteranceReport {
	position: usize,
	speaker: String,
	text: String,
	run: u32,
	total_ms_a: f64,
	total_ms_b: f64,
	faster: Lane,
	decision_a: Decision,
	decision_b: Decision,
	objection_a: Option<ObjectionType>,
	objection_b: Option<ObjectionType>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = counsel_config::load(&args.config)?;

	counsel_cli::init_tracing(&config.service.log_level);

	let case_id = args.case.clone().unwrap_or_else(|| config.pipeline.default_case.clone());
	let mode_a = args.mode_a.clone().unwrap_or_else(|| config.compare.mode_a.clone());
	let mode_b = args.mode_b.clone().unwrap_or_else(|| config.compare.mode_b.clone());
	let offline = args.corpus.is_some();
	let service = match &args.corpus {
		Some(path) => offline_service(config, &load_corpus(path)?)?,
		None => PipelineService::new(config)?,
	};
	let case = service.resolve_case(&case_id);

	if !case.is_known() {
		return Err(eyre::eyre!("Unknown case {case_id:?}."));
	}

	let mut comparisons = Vec::new();
	let mut utterances = Vec::new();

	for run in 1..=args.runs.max(1) {
		for utterance in &case.script {
			let request = CompareRequest {
				utterance_text: utterance.text.clone(),
				case_id: case.id.clone(),
				mode_a: Some(mode_a.clone()),
				mode_b: Some(mode_b.clone()),
				hybrid: Some(args.hybrid),
				session_id: None,
			};
			let comparison = service.compare(&request).await?;

			utterances.push(UtteranceReport {
				position: utterance.position,
				speaker: utterance.speaker.clone(),
				text: utterance.text.clone(),
				run,
				total_ms_a: comparison.trace_a.timings.total_ms,
				total_ms_b: comparison.trace_b.timings.total_ms,
				faster: comparison.faster,
				decision_a: comparison.trace_a.verdict.decision,
				decision_b: comparison.trace_b.verdict.decision,
				objection_a: comparison.trace_a.verdict.objection_type.clone(),
				objection_b: comparison.trace_b.verdict.objection_type.clone(),
			});
			comparisons.push(comparison);
		}
	}

	let output = ReplayOutput {
		case_id: case.id.clone(),
		mode_a,
		mode_b,
		offline,
		hybrid: args.hybrid,
		runs: args.runs.max(1),
		summary_a: summarize(comparisons.iter().map(|comparison| &comparison.trace_a)),
		summary_b: summarize(comparisons.iter().map(|comparison| &comparison.trace_b)),
		wins_a: wins(&comparisons, Lane::A),
		wins_b: wins(&comparisons, Lane::B),
		verdict_agreement: agreement(&comparisons),
		utterances,
	};
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

fn load_corpus(path: &Path) -> color_eyre::Result<Vec<CorpusDocument>> {
	let raw = fs::read_to_string(path)?;
	let docs = serde_json::from_str(&raw)?;

	Ok(docs)
}

/// Every mode embeds with its simulated embedder and searches one shared in-memory index.
fn offline_service(config: Config, corpus: &[CorpusDocument]) -> color_eyre::Result<PipelineService> {
	let mut index = InMemoryIndex::new();

	for mode in config.modes.values() {
		let collection = counsel_config::collection_for(&config, mode).to_string();

		if index.len(&collection) > 0 {
			continue;
		}

		let embedder = SimulatedEmbedder::from_mode(mode);

		index.create_collection(&collection);

		for doc in corpus {
			index.insert(&collection, doc.clone(), embedder.embed(&doc.text).vector);
		}
	}

	let index = Arc::new(index);
	let mut modes = BTreeMap::new();

	for (name, mode) in &config.modes {
		let embedder = Arc::new(SimulatedEmbedder::from_mode(mode));

		modes.insert(name.clone(), ModeAdapters::new(name, mode, &config, embedder, index.clone()));
	}

	Ok(PipelineService::with_modes(config, modes)?)
}

fn summarize<'a>(traces: impl Iterator<Item = &'a Trace>) -> LaneSummary {
	let mut totals = Vec::new();
	let mut embeds = Vec::new();
	let mut actionable = 0;
	let mut fallbacks = 0;
	let mut simulated_embeddings = 0;
	let mut degraded_searches = 0;

	for trace in traces {
		if trace.verdict.is_actionable() {
			actionable += 1;
		}
		if trace.fallback {
			fallbacks += 1;
		}
		if trace.embedding.as_ref().is_some_and(|embedding| embedding.simulated) {
			simulated_embeddings += 1;
		}
		if trace.search.as_ref().is_some_and(|search| search.degraded) {
			degraded_searches += 1;
		}
		// Skipped utterances never reach the backends and would flatten the latency profile.
		if trace.embedding.is_some() {
			totals.push(trace.timings.total_ms);
			embeds.push(trace.timings.embed_ms);
		}
	}

	totals.sort_by(f64::total_cmp);
	embeds.sort_by(f64::total_cmp);

	LaneSummary {
		total_ms_p50: percentile(&totals, 0.50),
		total_ms_p95: percentile(&totals, 0.95),
		embed_ms_p50: percentile(&embeds, 0.50),
		embed_ms_p95: percentile(&embeds, 0.95),
		actionable,
		fallbacks,
		simulated_embeddings,
		degraded_searches,
	}
}

fn wins(comparisons: &[Comparison], lane: Lane) -> usize {
	comparisons
		.iter()
		.filter(|comparison| comparison.trace_a.embedding.is_some())
		.filter(|comparison| comparison.faster == lane)
		.count()
}

fn agreement(comparisons: &[Comparison]) -> f64 {
	if comparisons.is_empty() {
		return 1.0;
	}

	let agreed = comparisons.iter().filter(|comparison| comparison.verdicts_agree()).count();

	agreed as f64 / comparisons.len() as f64
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;
		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}
