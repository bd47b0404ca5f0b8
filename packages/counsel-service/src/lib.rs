pub mod compare;
pub mod pipeline;
pub mod session;
pub mod trace;

mod error;

pub use compare::{CompareRequest, Comparison, Lane};
pub use error::{Error, Result};
pub use pipeline::RunRequest;
pub use session::CompareSession;
pub use trace::{EmbeddingStage, FusionMethod, FusionStage, SearchStage, StageTimings, Trace};

use std::{collections::BTreeMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use counsel_config::{Config, ModeConfig};
use counsel_domain::{
	cases::{self, CaseContext},
	decision::DecisionEngine,
};
use counsel_providers::{
	embedding::{DenseEmbedding, HttpEmbedder},
	simulated::SimulatedEmbedder,
};
use counsel_storage::{SearchHits, SearchRequest, memory::InMemoryIndex, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<DenseEmbedding>>;

	/// Simulated providers report the mode's documented latency instead of a measurement.
	fn is_simulated(&self) -> bool {
		false
	}
}

pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, req: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>>;
}

/// Everything one comparator lane needs, built once per configured mode.
#[derive(Clone)]
pub struct ModeAdapters {
	pub name: String,
	pub label: String,
	pub embedder: Arc<dyn EmbeddingProvider>,
	pub search: Arc<dyn SearchProvider>,
	pub simulated: SimulatedEmbedder,
	pub collection: String,
	pub dimensions: u32,
	pub embed_timeout: Duration,
}
impl ModeAdapters {
	pub fn new(
		name: &str,
		mode: &ModeConfig,
		cfg: &Config,
		embedder: Arc<dyn EmbeddingProvider>,
		search: Arc<dyn SearchProvider>,
	) -> Self {
		Self {
			name: name.to_string(),
			label: mode.label.clone(),
			embedder,
			search,
			simulated: SimulatedEmbedder::from_mode(mode),
			collection: counsel_config::collection_for(cfg, mode).to_string(),
			dimensions: mode.dimensions,
			embed_timeout: Duration::from_millis(mode.timeout_ms),
		}
	}
}

pub struct PipelineService {
	pub cfg: Config,
	engine: DecisionEngine,
	modes: BTreeMap<String, ModeAdapters>,
	search_timeout: Duration,
}
impl PipelineService {
	/// Builds one HTTP embedder per mode and a shared Qdrant store.
	///
	/// Configuration problems surface here and never from a pipeline run.
	pub fn new(cfg: Config) -> Result<Self> {
		counsel_config::validate(&cfg)?;

		let store = QdrantStore::new(&cfg.storage.qdrant).map_err(|err| Error::Configuration {
			message: format!("storage.qdrant: {err}"),
		})?;
		let store: Arc<dyn SearchProvider> = Arc::new(store);
		let mut modes = BTreeMap::new();

		for (name, mode) in &cfg.modes {
			let embedder = HttpEmbedder::new(mode).map_err(|err| Error::Configuration {
				message: format!("modes.{name}: {err}"),
			})?;

			modes.insert(
				name.clone(),
				ModeAdapters::new(name, mode, &cfg, Arc::new(embedder), store.clone()),
			);
		}

		Self::with_modes(cfg, modes)
	}

	pub fn with_modes(cfg: Config, modes: BTreeMap<String, ModeAdapters>) -> Result<Self> {
		counsel_config::validate(&cfg)?;

		for mode in [&cfg.compare.mode_a, &cfg.compare.mode_b] {
			if !modes.contains_key(mode) {
				return Err(Error::Configuration {
					message: format!("No adapters were built for compare mode {mode:?}."),
				});
			}
		}

		let engine = DecisionEngine::from_config(&cfg.pipeline);
		let search_timeout = Duration::from_millis(cfg.storage.qdrant.timeout_ms);

		Ok(Self { cfg, engine, modes, search_timeout })
	}

	pub fn engine(&self) -> &DecisionEngine {
		&self.engine
	}

	pub fn mode(&self, name: &str) -> Result<&ModeAdapters> {
		self.modes.get(name).ok_or_else(|| Error::UnknownMode { mode: name.to_string() })
	}

	pub fn modes(&self) -> impl Iterator<Item = &ModeAdapters> {
		self.modes.values()
	}

	/// Resolves a request's case id; blank ids select the default case.
	pub fn resolve_case(&self, case_id: &str) -> CaseContext {
		let case_id = case_id.trim();

		if case_id.is_empty() {
			return cases::get(&self.cfg.pipeline.default_case);
		}

		cases::get(case_id)
	}
}

impl EmbeddingProvider for HttpEmbedder {
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<DenseEmbedding>> {
		Box::pin(async move { HttpEmbedder::embed(self, text).await.map_err(Error::from) })
	}
}

impl EmbeddingProvider for SimulatedEmbedder {
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<DenseEmbedding>> {
		let embedding = SimulatedEmbedder::embed(self, text);

		Box::pin(async move { Ok(embedding) })
	}

	fn is_simulated(&self) -> bool {
		true
	}
}

impl SearchProvider for QdrantStore {
	fn search<'a>(&'a self, req: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		Box::pin(async move { QdrantStore::search(self, req).await.map_err(Error::from) })
	}
}

impl SearchProvider for InMemoryIndex {
	fn search<'a>(&'a self, req: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		Box::pin(async move { InMemoryIndex::search(self, req).map_err(Error::from) })
	}
}
