// std
use std::time::Duration as StdDuration;

// crates.io
use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One reranked candidate: the index into the submitted document list and
/// the cross-encoder relevance score.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct RerankedDoc {
	pub index: usize,
	pub score: f32,
}

/// Scores `docs` against `query` and returns them ordered best-first.
pub async fn rerank(
	cfg: &forage_config::ProviderConfig,
	query: &str,
	docs: &[String],
) -> Result<Vec<RerankedDoc>> {
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "model": cfg.model, "query": query, "documents": docs });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rerank_response(json, docs.len())
}

fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<RerankedDoc>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Rerank response is missing results array."))?;

	let mut ranked = Vec::with_capacity(results.len());
	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.ok_or_else(|| eyre::eyre!("Rerank result missing index."))? as usize;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| eyre::eyre!("Rerank result missing score."))? as f32;

		if index < doc_count {
			ranked.push(RerankedDoc { index, score });
		}
	}

	ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

	Ok(ranked)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn orders_results_best_first() {
		let json = serde_json::json!({
			"results": [
				{ "index": 1, "relevance_score": 0.2 },
				{ "index": 0, "relevance_score": 0.9 }
			]
		});
		let ranked = parse_rerank_response(json, 2).expect("parse failed");

		assert_eq!(ranked[0].index, 0);
		assert_eq!(ranked[1].index, 1);
	}

	#[test]
	fn drops_out_of_range_indices() {
		let json = serde_json::json!({
			"results": [
				{ "index": 5, "score": 0.9 },
				{ "index": 0, "score": 0.4 }
			]
		});
		let ranked = parse_rerank_response(json, 2).expect("parse failed");

		assert_eq!(ranked.len(), 1);
		assert_eq!(ranked[0].index, 0);
	}
}
