use serde_json::Value;

use crate::{SearchError, SearchResult, SemanticSearch, cache_key};

impl SemanticSearch {
	/// Fetch-or-compute the search embedding for a term. Both flavours are
	/// idempotent once warm: repeated identical queries hit the cache and
	/// make no external calls.
	pub async fn embedding_for(&self, term: &str, use_hyde: bool) -> SearchResult<Vec<f32>> {
		if use_hyde { self.hyde_embedding(term).await } else { self.direct_embedding(term).await }
	}

	/// Whether a warm hyde-flavoured embedding exists for the term under the
	/// current model configuration.
	pub async fn is_cached(&self, term: &str) -> SearchResult<bool> {
		let digest = cache_key::query_digest(term);
		let key = cache_key::embedding_key(
			&digest,
			&self.cfg.providers.completion.model,
			&self.cfg.providers.embedding.model,
		);

		Ok(self.cache.get(&key).await?.is_some())
	}

	/// Drops every entry the hyde pipeline may have written for the term:
	/// the hypothetical document, its embedding, and the degenerate
	/// empty-digest raw key, all derived from the current model
	/// configuration so invalidation reaches exactly what generation wrote.
	pub async fn clear_cache_for(&self, term: &str) -> SearchResult<()> {
		let digest = cache_key::query_digest(term);
		let hyde_model = &self.cfg.providers.completion.model;
		let embedding_model = &self.cfg.providers.embedding.model;

		self.cache.delete(&cache_key::hyde_key(&digest, hyde_model)).await?;
		self.cache.delete(&cache_key::embedding_key(&digest, hyde_model, embedding_model)).await?;
		self.cache.delete(&cache_key::raw_embedding_key("", embedding_model)).await?;

		Ok(())
	}

	async fn hyde_embedding(&self, term: &str) -> SearchResult<Vec<f32>> {
		let digest = cache_key::query_digest(term);
		let hyde_model = &self.cfg.providers.completion.model;
		let embedding_model = &self.cfg.providers.embedding.model;
		let hyde_key = cache_key::hyde_key(&digest, hyde_model);
		let embedding_key = cache_key::embedding_key(&digest, hyde_model, embedding_model);

		let document = match self.cached_string(&hyde_key).await? {
			Some(document) => document,
			None => {
				let document = self.hypothetical_post_from(term).await?;

				self.cache
					.set(&hyde_key, Value::String(document.clone()), self.cache_ttl())
					.await?;

				document
			},
		};

		match self.cached_vector(&embedding_key).await? {
			Some(vector) => Ok(vector),
			None => {
				let vector = self.embed_one(&document, false).await?;

				self.cache.set(&embedding_key, vector_payload(&vector), self.cache_ttl()).await?;

				Ok(vector)
			},
		}
	}

	async fn direct_embedding(&self, term: &str) -> SearchResult<Vec<f32>> {
		let digest = cache_key::query_digest(term);
		let key = cache_key::raw_embedding_key(&digest, &self.cfg.providers.embedding.model);

		match self.cached_vector(&key).await? {
			Some(vector) => Ok(vector),
			None => {
				// The raw term is a short query matched against document
				// vectors, so the asymmetric regime applies.
				let vector = self.embed_one(term, true).await?;

				self.cache.set(&key, vector_payload(&vector), self.cache_ttl()).await?;

				Ok(vector)
			},
		}
	}

	async fn embed_one(&self, text: &str, asymmetric: bool) -> SearchResult<Vec<f32>> {
		let texts = [text.to_string()];
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &texts, asymmetric)
			.await?;

		vectors.into_iter().next().ok_or_else(|| SearchError::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})
	}

	async fn cached_string(&self, key: &str) -> SearchResult<Option<String>> {
		let Some(payload) = self.cache.get(key).await? else {
			tracing::info!(cache_key_prefix = cache_key_prefix(key), hit = false, "Cache miss.");

			return Ok(None);
		};
		let Some(text) = payload.as_str() else {
			tracing::warn!(
				cache_key_prefix = cache_key_prefix(key),
				"Cache payload decode failed."
			);

			return Ok(None);
		};

		tracing::info!(cache_key_prefix = cache_key_prefix(key), hit = true, "Cache hit.");

		Ok(Some(text.to_string()))
	}

	async fn cached_vector(&self, key: &str) -> SearchResult<Option<Vec<f32>>> {
		let Some(payload) = self.cache.get(key).await? else {
			tracing::info!(cache_key_prefix = cache_key_prefix(key), hit = false, "Cache miss.");

			return Ok(None);
		};

		// Corrupt payloads are a miss, never an error; the recomputation
		// path overwrites them.
		match serde_json::from_value::<Vec<f32>>(payload) {
			Ok(vector) => {
				tracing::info!(cache_key_prefix = cache_key_prefix(key), hit = true, "Cache hit.");

				Ok(Some(vector))
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload decode failed."
				);

				Ok(None)
			},
		}
	}
}

fn vector_payload(vector: &[f32]) -> Value {
	Value::Array(vector.iter().map(|value| Value::from(*value as f64)).collect())
}

fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_payload_round_trips() {
		let payload = vector_payload(&[0.5, -1.0]);

		assert_eq!(serde_json::from_value::<Vec<f32>>(payload).unwrap(), vec![0.5, -1.0]);
	}

	#[test]
	fn key_prefix_is_bounded() {
		assert_eq!(cache_key_prefix("short"), "short");
		assert_eq!(cache_key_prefix("semantic-search-abcdef"), "semantic-sea");
	}
}
