use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use counsel_config::{ApiStyle, Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_toml_with_mode_field(mode: &str, field: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let table = root
		.get_mut("modes")
		.and_then(|modes| modes.get_mut(mode))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include the requested mode.");

	table.insert(field.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("counsel_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads_and_normalizes() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = counsel_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must be valid.");
	let local = cfg.modes.get("local").expect("Missing local mode.");

	assert_eq!(cfg.storage.qdrant.api_key, None);
	assert_eq!(local.collection, None);
	assert_eq!(local.api_style, ApiStyle::Fastembed);
	assert_eq!(cfg.modes["qdrant"].api_base, "https://inference.example.cloud.qdrant.io");
	assert_eq!(counsel_config::collection_for(&cfg, local), "legal_memory");
}

#[test]
fn missing_api_key_is_a_credential_error() {
	let payload = sample_toml_with_mode_field("jina", "api_key", Value::String("  ".to_string()));
	let path = write_temp_config(payload);
	let result = counsel_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected missing credential error.");

	assert!(
		matches!(&err, Error::MissingCredential { section, field: "api_key" } if section == "modes.jina"),
		"Unexpected error: {err}"
	);
}

#[test]
fn fastembed_modes_do_not_need_api_keys() {
	let cfg = base_config();

	assert!(cfg.modes["local"].api_key.is_empty());
	assert!(counsel_config::validate(&cfg).is_ok());
}

#[test]
fn mode_dimensions_must_match_vector_dim() {
	let payload = sample_toml_with_mode_field("qdrant", "dimensions", Value::Integer(1_024));
	let path = write_temp_config(payload);
	let result = counsel_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected dimension validation error.");

	assert!(
		err.to_string().contains("modes.qdrant.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn compare_modes_must_be_configured() {
	let mut cfg = base_config();

	cfg.compare.mode_b = "hf".to_string();

	let err = counsel_config::validate(&cfg).expect_err("Expected compare mode validation error.");

	assert!(
		err.to_string().contains("compare.mode_b references unknown mode \"hf\"."),
		"Unexpected error: {err}"
	);
}

#[test]
fn search_limit_must_cover_top_k() {
	let mut cfg = base_config();

	cfg.pipeline.top_k = 12;

	let err = counsel_config::validate(&cfg).expect_err("Expected search limit validation error.");

	assert!(
		err.to_string().contains("pipeline.search_limit must be at least pipeline.top_k."),
		"Unexpected error: {err}"
	);
}

#[test]
fn decision_threshold_is_bounded() {
	let mut cfg = base_config();

	cfg.pipeline.decision_threshold = 101;

	assert!(counsel_config::validate(&cfg).is_err());

	cfg.pipeline.decision_threshold = 100;

	assert!(counsel_config::validate(&cfg).is_ok());
}

#[test]
fn pipeline_defaults_apply_when_table_is_absent() {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");

	root.as_table_mut().expect("Sample config must be a table.").remove("pipeline");

	let cfg: Config = toml::from_str(&toml::to_string(&root).expect("Failed to render config."))
		.expect("Failed to parse config without pipeline table.");

	assert_eq!(cfg.pipeline.top_k, 3);
	assert_eq!(cfg.pipeline.rrf_k, 60.0);
	assert_eq!(cfg.pipeline.decision_threshold, 85);
	assert_eq!(cfg.pipeline.default_case, "msft");
}
