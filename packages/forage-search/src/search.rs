use forage_domain::plan::FilterPlan;
use forage_storage::models::Post;

use crate::{SearchResult, SemanticSearch, text};

/// Candidate topics are over-selected by this factor so downstream
/// permission and lexical filtering still leaves a full page.
pub const OVER_SELECTION_FACTOR: u32 = 4;

pub const MAX_RESULTS_PER_PAGE: u32 = 100;

/// Quick search returns at most this many reranked posts.
pub const QUICK_SEARCH_RESULTS: usize = 5;

const QUICK_SEARCH_CANDIDATES: u64 = 100;
const RERANK_DOC_CHARS: usize = 2000;

/// Lexical search output: the matching posts plus the tokens no directive
/// recognized, for caller-side feedback.
#[derive(Debug)]
pub struct FilteredSearch {
	pub posts: Vec<Post>,
	pub invalid_tokens: Vec<String>,
}

impl SemanticSearch {
	/// Semantic topic search: embeds the free-text term (via HyDE when
	/// requested), over-selects similarity candidates, materializes each
	/// topic's first post in candidate rank order, then applies the plan's
	/// predicates and the permission guard.
	pub async fn search_for_topics(
		&self,
		query: &str,
		page: u32,
		hyde: bool,
	) -> SearchResult<Vec<Post>> {
		let plan = self.parse_plan(query);
		let term = plan.term.clone();

		if term.is_empty() || self.below_min_term_length(&term) {
			return Ok(Vec::new());
		}

		let limit = self.cfg.search.per_filter.min(MAX_RESULTS_PER_PAGE) + 1;
		let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
		let embedding = self.embedding_for(&term, hyde).await?;
		let over_selection_limit = u64::from(limit * OVER_SELECTION_FACTOR);
		let candidate_topic_ids =
			self.index.similar_topics(embedding, over_selection_limit, offset).await?;

		tracing::info!(
			candidates = candidate_topic_ids.len(),
			limit,
			offset,
			hyde,
			"Similarity candidates fetched."
		);

		let posts = self
			.content
			.first_posts_for_topics(&candidate_topic_ids, &plan, limit as i64)
			.await?;

		self.guard.filter_allowed(posts).await
	}

	/// Reranked post search: direct asymmetric embedding, a fixed candidate
	/// cap, cross-encoder rerank of the filtered candidates, then the top
	/// five refetched in rerank order and permission-checked once more.
	pub async fn quick_search(&self, query: &str) -> SearchResult<Vec<Post>> {
		let plan = self.parse_plan(query);
		let term = plan.term.clone();

		if term.is_empty() || self.below_min_term_length(&term) {
			return Ok(Vec::new());
		}

		let embedding = self.embedding_for(&term, false).await?;
		let candidate_post_ids =
			self.index.similar_posts(embedding, QUICK_SEARCH_CANDIDATES).await?;
		let candidates = self.content.posts_by_ids(&candidate_post_ids, &plan).await?;
		let candidates = self.guard.filter_allowed(candidates).await?;

		if candidates.is_empty() {
			return Ok(candidates);
		}

		let docs: Vec<String> = candidates
			.iter()
			.map(|post| text::truncate_chars(&text::plain_text_of(&post.cooked), RERANK_DOC_CHARS))
			.collect();
		let reranked =
			self.providers.rerank.rerank(&self.cfg.providers.rerank, &term, &docs).await?;
		let reordered_ids: Vec<i64> = reranked
			.iter()
			.filter_map(|doc| candidates.get(doc.index))
			.map(|post| post.id)
			.take(QUICK_SEARCH_RESULTS)
			.collect();

		// Refetch in rerank order. A reranked post must still be visible at
		// output time, so the guard runs again.
		let posts = self.content.posts_by_ids(&reordered_ids, &FilterPlan::default()).await?;

		self.guard.filter_allowed(posts).await
	}

	/// Lexical path: the parsed plan goes straight to the content store.
	/// Directive-only queries have no term and still run; a present but
	/// sub-minimum term matches nothing, same as the semantic paths.
	pub async fn filtered_search(&self, query: &str) -> SearchResult<FilteredSearch> {
		let plan = self.parse_plan(query);

		if !plan.term.is_empty() && self.below_min_term_length(&plan.term) {
			return Ok(FilteredSearch {
				posts: Vec::new(),
				invalid_tokens: plan.context.invalid_tokens,
			});
		}

		let posts = self.content.filtered_posts(&plan).await?;

		Ok(FilteredSearch { posts, invalid_tokens: plan.context.invalid_tokens })
	}

	fn below_min_term_length(&self, term: &str) -> bool {
		(term.chars().count() as u32) < self.cfg.search.min_term_length
	}
}
