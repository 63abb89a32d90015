use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use forage_config::Config;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn set_path(value: &mut Value, path: &[&str], leaf: Value) {
	let mut cursor = value;

	for key in &path[..path.len() - 1] {
		cursor = cursor
			.as_table_mut()
			.and_then(|table| table.get_mut(*key))
			.expect("Sample config must include the requested table.");
	}

	cursor
		.as_table_mut()
		.expect("Sample config leaf parent must be a table.")
		.insert(path[path.len() - 1].to_string(), leaf);
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

	path.push(format!("forage_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_mutated(path: &[&str], leaf: Value) -> forage_config::Result<Config> {
	let mut value = sample_value();

	set_path(&mut value, path, leaf);

	let payload = toml::to_string(&value).expect("Failed to render test config.");
	let file = write_temp_config(payload);
	let result = forage_config::load(&file);

	fs::remove_file(&file).expect("Failed to remove test config.");

	result
}

#[test]
fn sample_config_loads() {
	let file = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = forage_config::load(&file);

	fs::remove_file(&file).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must validate.");

	assert_eq!(cfg.search.min_term_length, 3);
	assert_eq!(cfg.cache.ttl_days, 7);
	assert_eq!(cfg.providers.embedding.dimensions, cfg.storage.qdrant.vector_dim);
}

#[test]
fn rejects_zero_min_term_length() {
	let err = load_mutated(&["search", "min_term_length"], Value::Integer(0))
		.expect_err("Expected min_term_length validation error.");

	assert!(err.to_string().contains("search.min_term_length"));
}

#[test]
fn rejects_non_positive_cache_ttl() {
	let err = load_mutated(&["cache", "ttl_days"], Value::Integer(0))
		.expect_err("Expected cache.ttl_days validation error.");

	assert!(err.to_string().contains("cache.ttl_days"));
}

#[test]
fn rejects_dimension_mismatch() {
	let err = load_mutated(&["storage", "qdrant", "vector_dim"], Value::Integer(512))
		.expect_err("Expected dimension mismatch validation error.");

	assert!(err.to_string().contains("vector_dim"));
}

#[test]
fn rejects_empty_provider_api_key() {
	let err = load_mutated(&["providers", "rerank", "api_key"], Value::String(" ".to_string()))
		.expect_err("Expected api_key validation error.");

	assert!(err.to_string().contains("rerank api_key"));
}

#[test]
fn trims_site_identity() {
	let cfg = load_mutated(&["site", "title"], Value::String("  Rust Forum  ".to_string()))
		.expect("Config must validate.");

	assert_eq!(cfg.site.title, "Rust Forum");
}
