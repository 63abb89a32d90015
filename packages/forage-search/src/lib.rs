pub mod cache_key;
pub mod embedding;
pub mod hyde;
pub mod search;
pub mod text;

use std::{future::Future, pin::Pin, sync::Arc};

use forage_config::{CompletionProviderConfig, Config, EmbeddingProviderConfig, ProviderConfig};
use forage_domain::{plan::FilterPlan, registry::FilterRegistry};
use forage_providers::{completion, embedding as embedding_api, rerank};
pub use forage_providers::rerank::RerankedDoc;
use forage_storage::{
	cache::PgCacheStore,
	content::PgContentStore,
	models::Post,
	qdrant::QdrantIndex,
};
pub use search::FilteredSearch;
use serde_json::Value;
use time::Duration;

pub type SearchResult<T> = Result<T, SearchError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Post retrieval with the base visibility clause applied first. Id-list
/// fetches must return rows in exactly the given id order.
pub trait ContentStore
where
	Self: Send + Sync,
{
	fn filtered_posts<'a>(&'a self, plan: &'a FilterPlan) -> BoxFuture<'a, SearchResult<Vec<Post>>>;

	fn first_posts_for_topics<'a>(
		&'a self,
		topic_ids: &'a [i64],
		plan: &'a FilterPlan,
		limit: i64,
	) -> BoxFuture<'a, SearchResult<Vec<Post>>>;

	fn posts_by_ids<'a>(
		&'a self,
		post_ids: &'a [i64],
		plan: &'a FilterPlan,
	) -> BoxFuture<'a, SearchResult<Vec<Post>>>;
}

pub trait CacheStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, SearchResult<Option<Value>>>;

	fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Duration)
	-> BoxFuture<'a, SearchResult<()>>;

	fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, SearchResult<()>>;
}

/// Nearest-neighbour candidate retrieval. Returned ids are in rank order and
/// that order is part of the contract.
pub trait SimilarityIndex
where
	Self: Send + Sync,
{
	fn similar_topics<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		offset: u64,
	) -> BoxFuture<'a, SearchResult<Vec<i64>>>;

	fn similar_posts<'a>(&'a self, vector: Vec<f32>, limit: u64)
	-> BoxFuture<'a, SearchResult<Vec<i64>>>;
}

pub trait PermissionGuard
where
	Self: Send + Sync,
{
	fn filter_allowed<'a>(&'a self, posts: Vec<Post>) -> BoxFuture<'a, SearchResult<Vec<Post>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
		user: Option<&'a str>,
		feature: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		asymmetric: bool,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<RerankedDoc>>>;
}

#[derive(Debug)]
pub enum SearchError {
	Provider { message: String },
	Storage { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
}

/// The search orchestrator: lexical filtered search plus the semantic
/// pipeline (HyDE, cached embeddings, similarity candidates, reranking).
pub struct SemanticSearch {
	pub cfg: Config,
	pub registry: FilterRegistry,
	pub content: Arc<dyn ContentStore>,
	pub cache: Arc<dyn CacheStore>,
	pub index: Arc<dyn SimilarityIndex>,
	pub guard: Arc<dyn PermissionGuard>,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for SearchError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for SearchError {}

impl From<forage_storage::Error> for SearchError {
	fn from(err: forage_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for SearchError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl CompletionProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		messages: &'a [Value],
		user: Option<&'a str>,
		feature: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::generate(cfg, messages, user, feature))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		asymmetric: bool,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding_api::embed(cfg, texts, asymmetric))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<RerankedDoc>>> {
		Box::pin(rerank::rerank(cfg, query, docs))
	}
}

impl Providers {
	pub fn new(
		completion: Arc<dyn CompletionProvider>,
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
	) -> Self {
		Self { completion, embedding, rerank }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { completion: provider.clone(), embedding: provider.clone(), rerank: provider }
	}
}

impl SemanticSearch {
	pub fn new(
		cfg: Config,
		content: Arc<dyn ContentStore>,
		cache: Arc<dyn CacheStore>,
		index: Arc<dyn SimilarityIndex>,
		guard: Arc<dyn PermissionGuard>,
	) -> Self {
		Self {
			cfg,
			registry: FilterRegistry::standard(),
			content,
			cache,
			index,
			guard,
			providers: Providers::default(),
		}
	}

	pub fn with_providers(
		cfg: Config,
		content: Arc<dyn ContentStore>,
		cache: Arc<dyn CacheStore>,
		index: Arc<dyn SimilarityIndex>,
		guard: Arc<dyn PermissionGuard>,
		providers: Providers,
	) -> Self {
		Self { cfg, registry: FilterRegistry::standard(), content, cache, index, guard, providers }
	}

	pub(crate) fn parse_plan(&self, query: &str) -> FilterPlan {
		forage_domain::engine::FilterEngine::new(&self.registry).parse(query)
	}

	pub(crate) fn cache_ttl(&self) -> Duration {
		Duration::days(self.cfg.cache.ttl_days)
	}
}

impl ContentStore for PgContentStore {
	fn filtered_posts<'a>(&'a self, plan: &'a FilterPlan) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		Box::pin(async move { Ok(PgContentStore::filtered_posts(self, plan).await?) })
	}

	fn first_posts_for_topics<'a>(
		&'a self,
		topic_ids: &'a [i64],
		plan: &'a FilterPlan,
		limit: i64,
	) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		Box::pin(async move {
			Ok(PgContentStore::first_posts_for_topics(self, topic_ids, plan, limit).await?)
		})
	}

	fn posts_by_ids<'a>(
		&'a self,
		post_ids: &'a [i64],
		plan: &'a FilterPlan,
	) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		Box::pin(async move { Ok(PgContentStore::posts_by_ids(self, post_ids, plan).await?) })
	}
}

impl CacheStore for PgCacheStore {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, SearchResult<Option<Value>>> {
		Box::pin(async move { Ok(PgCacheStore::get(self, key).await?) })
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		ttl: Duration,
	) -> BoxFuture<'a, SearchResult<()>> {
		Box::pin(async move { Ok(PgCacheStore::set(self, key, value, ttl).await?) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, SearchResult<()>> {
		Box::pin(async move { Ok(PgCacheStore::delete(self, key).await?) })
	}
}

impl SimilarityIndex for QdrantIndex {
	fn similar_topics<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		offset: u64,
	) -> BoxFuture<'a, SearchResult<Vec<i64>>> {
		Box::pin(async move { Ok(QdrantIndex::similar_topics(self, vector, limit, offset).await?) })
	}

	fn similar_posts<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
	) -> BoxFuture<'a, SearchResult<Vec<i64>>> {
		Box::pin(async move { Ok(QdrantIndex::similar_posts(self, vector, limit).await?) })
	}
}
