mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, CompletionProviderConfig, Config, EmbeddingProviderConfig, Postgres, ProviderConfig,
	Providers, Qdrant, Search, Site, Storage,
};

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
	if cfg.site.title.trim().is_empty() {
		return Err(Error::Validation { message: "site.title must be non-empty.".to_string() });
	}
	if cfg.search.min_term_length == 0 {
		return Err(Error::Validation {
			message: "search.min_term_length must be greater than zero.".to_string(),
		});
	}
	if cfg.search.per_filter == 0 {
		return Err(Error::Validation {
			message: "search.per_filter must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.ttl_days <= 0 {
		return Err(Error::Validation {
			message: "cache.ttl_days must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.storage.qdrant.topic_collection.trim().is_empty()
		|| cfg.storage.qdrant.post_collection.trim().is_empty()
	{
		return Err(Error::Validation {
			message: "storage.qdrant collections must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.completion.temperature.is_finite()
		|| cfg.providers.completion.temperature < 0.0
	{
		return Err(Error::Validation {
			message: "providers.completion.temperature must be zero or greater.".to_string(),
		});
	}

	for (label, key) in [
		("completion", &cfg.providers.completion.api_key),
		("embedding", &cfg.providers.embedding.api_key),
		("rerank", &cfg.providers.rerank.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.site.title = cfg.site.title.trim().to_string();
	cfg.site.description = cfg.site.description.trim().to_string();
}
