//! Cache key derivation. Reads, writes and invalidation must compute
//! byte-identical keys for the same term and model configuration, so every
//! call site goes through these functions.

pub fn query_digest(term: &str) -> String {
	blake3::hash(term.trim().as_bytes()).to_hex().to_string()
}

pub fn hyde_key(digest: &str, hyde_model: &str) -> String {
	format!("semantic-search-{digest}-{hyde_model}")
}

pub fn embedding_key(digest: &str, hyde_model: &str, embedding_model: &str) -> String {
	format!("{}-{embedding_model}", hyde_key(digest, hyde_model))
}

/// Key for embeddings computed from the raw term, bypassing HyDE. The hyde
/// model component is empty so the two flavours can never collide.
pub fn raw_embedding_key(digest: &str, embedding_model: &str) -> String {
	embedding_key(digest, "", embedding_model)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn digest_is_deterministic_and_trims() {
		assert_eq!(query_digest("rust lifetimes"), query_digest("  rust lifetimes  "));
		assert_ne!(query_digest("rust lifetimes"), query_digest("rust borrows"));
	}

	#[test]
	fn key_shapes_compose() {
		let digest = "abc123";

		assert_eq!(hyde_key(digest, "gpt"), "semantic-search-abc123-gpt");
		assert_eq!(embedding_key(digest, "gpt", "small"), "semantic-search-abc123-gpt-small");
		assert_eq!(raw_embedding_key(digest, "small"), "semantic-search-abc123--small");
	}

	#[test]
	fn keys_are_byte_identical_across_calls() {
		let first = embedding_key(&query_digest("foo"), "gpt", "small");
		let second = embedding_key(&query_digest("foo"), "gpt", "small");

		assert_eq!(first, second);
	}
}
