mod error;
mod types;

pub use error::{Error, Result};
pub use types::{ApiStyle, Compare, Config, ModeConfig, Pipeline, Qdrant, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::MissingCredential {
			section: "storage.qdrant".to_string(),
			field: "url",
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.timeout_ms must be greater than zero.".to_string(),
		});
	}

	validate_pipeline(&cfg.pipeline)?;

	if cfg.modes.is_empty() {
		return Err(Error::Validation {
			message: "At least one [modes.<name>] table is required.".to_string(),
		});
	}

	for (name, mode) in &cfg.modes {
		validate_mode(name, mode, cfg.storage.qdrant.vector_dim)?;
	}

	for (label, mode) in [("compare.mode_a", &cfg.compare.mode_a), ("compare.mode_b", &cfg.compare.mode_b)]
	{
		if !cfg.modes.contains_key(mode) {
			return Err(Error::Validation {
				message: format!("{label} references unknown mode {mode:?}."),
			});
		}
	}

	Ok(())
}

/// Collection searched by `mode`, falling back to the storage default.
pub fn collection_for<'a>(cfg: &'a Config, mode: &'a ModeConfig) -> &'a str {
	mode.collection.as_deref().unwrap_or(cfg.storage.qdrant.collection.as_str())
}

fn validate_pipeline(pipeline: &Pipeline) -> Result<()> {
	if pipeline.top_k == 0 {
		return Err(Error::Validation {
			message: "pipeline.top_k must be greater than zero.".to_string(),
		});
	}
	if pipeline.search_limit < pipeline.top_k {
		return Err(Error::Validation {
			message: "pipeline.search_limit must be at least pipeline.top_k.".to_string(),
		});
	}
	if !pipeline.rrf_k.is_finite() || pipeline.rrf_k <= 0.0 {
		return Err(Error::Validation {
			message: "pipeline.rrf_k must be a finite number greater than zero.".to_string(),
		});
	}
	if pipeline.decision_threshold > 100 {
		return Err(Error::Validation {
			message: "pipeline.decision_threshold must be in the range 0-100.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&pipeline.evidence_min_score) {
		return Err(Error::Validation {
			message: "pipeline.evidence_min_score must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (label, value) in [
		("pipeline.default_case", &pipeline.default_case),
		("pipeline.universal_case", &pipeline.universal_case),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	Ok(())
}

fn validate_mode(name: &str, mode: &ModeConfig, vector_dim: u32) -> Result<()> {
	let section = format!("modes.{name}");

	if mode.api_base.trim().is_empty() {
		return Err(Error::MissingCredential { section, field: "api_base" });
	}
	if mode.api_style == ApiStyle::Openai && mode.api_key.trim().is_empty() {
		return Err(Error::MissingCredential { section, field: "api_key" });
	}
	if mode.model.trim().is_empty() {
		return Err(Error::Validation { message: format!("{section}.model must be non-empty.") });
	}
	if mode.dimensions == 0 {
		return Err(Error::Validation {
			message: format!("{section}.dimensions must be greater than zero."),
		});
	}
	if mode.dimensions != vector_dim {
		return Err(Error::Validation {
			message: format!("{section}.dimensions must match storage.qdrant.vector_dim."),
		});
	}
	if mode.timeout_ms == 0 {
		return Err(Error::Validation {
			message: format!("{section}.timeout_ms must be greater than zero."),
		});
	}
	if mode.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: format!("{section}.default_headers values must be strings."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.storage.qdrant.api_key = None;
	}

	for mode in cfg.modes.values_mut() {
		if mode.collection.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false) {
			mode.collection = None;
		}

		mode.api_base = mode.api_base.trim_end_matches('/').to_string();
	}
}
