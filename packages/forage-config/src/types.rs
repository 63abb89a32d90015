use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub site: Site,
	pub search: Search,
	pub cache: Cache,
	pub providers: Providers,
	pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Site {
	pub title: String,
	pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Queries whose free-text term is shorter than this return no results.
	pub min_term_length: u32,
	/// Requested results per page before the similarity over-selection is applied.
	pub per_filter: u32,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	pub ttl_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub completion: CompletionProviderConfig,
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub topic_collection: String,
	pub post_collection: String,
	pub vector_dim: u32,
}
