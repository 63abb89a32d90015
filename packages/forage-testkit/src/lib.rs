//! In-memory implementations of the search capability traits, plus stub and
//! spy providers. Everything here is deterministic: the cache store runs on
//! an advanceable clock and the similarity index returns canned candidates
//! while recording what was asked of it.

use std::{
	collections::{BTreeSet, HashMap},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use forage_config::{CompletionProviderConfig, EmbeddingProviderConfig, ProviderConfig};
use forage_domain::plan::{FilterPlan, Predicate, SortOrder};
use forage_search::{
	BoxFuture, CacheStore, CompletionProvider, ContentStore, EmbeddingProvider, PermissionGuard,
	RerankProvider, RerankedDoc, SearchResult, SimilarityIndex,
};
use forage_storage::models::{Post, Topic};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

/// TTL cache over a plain map. Time only moves when a test calls
/// [`MemoryCacheStore::advance`].
pub struct MemoryCacheStore {
	entries: Mutex<HashMap<String, (Value, OffsetDateTime)>>,
	now: Mutex<OffsetDateTime>,
}
impl MemoryCacheStore {
	pub fn new() -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			now: Mutex::new(OffsetDateTime::UNIX_EPOCH),
		}
	}

	pub fn advance(&self, by: Duration) {
		let mut now = lock(&self.now);

		*now += by;
	}

	pub fn len(&self) -> usize {
		lock(&self.entries).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn contains(&self, key: &str) -> bool {
		let now = *lock(&self.now);

		lock(&self.entries).get(key).is_some_and(|(_, expires_at)| *expires_at > now)
	}
}
impl Default for MemoryCacheStore {
	fn default() -> Self {
		Self::new()
	}
}
impl CacheStore for MemoryCacheStore {
	fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, SearchResult<Option<Value>>> {
		let now = *lock(&self.now);
		let value = lock(&self.entries)
			.get(key)
			.filter(|(_, expires_at)| *expires_at > now)
			.map(|(value, _)| value.clone());

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		ttl: Duration,
	) -> BoxFuture<'a, SearchResult<()>> {
		let now = *lock(&self.now);

		lock(&self.entries).insert(key.to_string(), (value, now + ttl));

		Box::pin(async move { Ok(()) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, SearchResult<()>> {
		lock(&self.entries).remove(key);

		Box::pin(async move { Ok(()) })
	}
}

/// In-memory forum content evaluating filter plans with the same semantics
/// as the Postgres store: base visibility, predicates, forced-id merge,
/// order, limit, offset, and rank-preserving id fetches.
#[derive(Default)]
pub struct MemoryContentStore {
	topics: HashMap<i64, Topic>,
	posts: Vec<Post>,
	topic_tags: HashMap<i64, BTreeSet<String>>,
	categories: HashMap<i64, (String, String)>,
	users: HashMap<i64, String>,
	groups: HashMap<String, BTreeSet<i64>>,
}
impl MemoryContentStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_topic(mut self, topic: Topic) -> Self {
		self.topics.insert(topic.id, topic);

		self
	}

	pub fn with_post(mut self, post: Post) -> Self {
		self.posts.push(post);

		self
	}

	pub fn with_topic_tags(mut self, topic_id: i64, tags: &[&str]) -> Self {
		self.topic_tags
			.entry(topic_id)
			.or_default()
			.extend(tags.iter().map(|tag| tag.to_string()));

		self
	}

	/// `(id, name, slug)`.
	pub fn with_category(mut self, id: i64, name: &str, slug: &str) -> Self {
		self.categories.insert(id, (name.to_string(), slug.to_string()));

		self
	}

	pub fn with_user(mut self, id: i64, username: &str) -> Self {
		self.users.insert(id, username.to_string());

		self
	}

	pub fn with_group(mut self, name: &str, member_ids: &[i64]) -> Self {
		self.groups
			.entry(name.to_lowercase())
			.or_default()
			.extend(member_ids.iter().copied());

		self
	}

	fn visible(&self, post: &Post) -> bool {
		self.topics.get(&post.topic_id).is_some_and(|topic| topic.visible)
	}

	fn matches(&self, post: &Post, predicate: &Predicate) -> bool {
		let Some(topic) = self.topics.get(&post.topic_id) else {
			return false;
		};

		match predicate {
			Predicate::Open => !topic.closed && !topic.archived,
			Predicate::Closed => topic.closed,
			Predicate::Archived => topic.archived,
			Predicate::NoReplies => topic.posts_count == 1,
			Predicate::SingleUser => topic.participant_count == 1,
			Predicate::PostedBefore(date) => post.created_at < *date,
			Predicate::PostedAfter(date) => post.created_at > *date,
			Predicate::TopicCreatedBefore(date) => topic.created_at < *date,
			Predicate::TopicCreatedAfter(date) => topic.created_at > *date,
			Predicate::Tagged(names) => self
				.topic_tags
				.get(&topic.id)
				.is_some_and(|tags| names.iter().any(|name| tags.contains(name))),
			Predicate::InCategories(names) =>
				topic.category_id.and_then(|id| self.categories.get(&id)).is_some_and(
					|(name, slug)| names.iter().any(|given| given == name || given == slug),
				),
			Predicate::ByUser(username) => post
				.user_id
				.and_then(|id| self.users.get(&id))
				.is_some_and(|found| found.to_lowercase() == *username),
			Predicate::ByGroup(name) => post.user_id.is_some_and(|id| {
				self.groups.get(&name.to_lowercase()).is_some_and(|members| members.contains(&id))
			}),
			Predicate::Keywords(words) => {
				let raw = post.raw.to_lowercase();

				words.iter().any(|word| raw.contains(&word.to_lowercase()))
			},
			Predicate::Nothing => false,
		}
	}

	fn passes_plan(&self, post: &Post, plan: &FilterPlan) -> bool {
		if !self.visible(post) {
			return false;
		}

		let narrowed_match = plan.predicates.iter().all(|predicate| self.matches(post, predicate));
		let forced = &plan.context.forced_topic_ids;

		if forced.is_empty() {
			narrowed_match
		} else if !plan.narrowed() {
			forced.contains(&post.topic_id)
		} else {
			forced.contains(&post.topic_id) || narrowed_match
		}
	}

	fn sorted(&self, mut posts: Vec<Post>, order: SortOrder) -> Vec<Post> {
		let topic_created = |post: &Post| {
			self.topics.get(&post.topic_id).map(|topic| topic.created_at)
		};

		match order {
			SortOrder::LatestPost => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
			SortOrder::OldestPost => posts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
			SortOrder::LatestTopic => posts.sort_by(|a, b| {
				topic_created(b)
					.cmp(&topic_created(a))
					.then(b.post_number.cmp(&a.post_number))
			}),
			SortOrder::OldestTopic => posts.sort_by(|a, b| {
				topic_created(a)
					.cmp(&topic_created(b))
					.then(a.post_number.cmp(&b.post_number))
			}),
		}

		posts
	}
}
impl ContentStore for MemoryContentStore {
	fn filtered_posts<'a>(&'a self, plan: &'a FilterPlan) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		let matching: Vec<Post> =
			self.posts.iter().filter(|post| self.passes_plan(post, plan)).cloned().collect();
		let sorted = self.sorted(matching, plan.context.order);
		let offset = plan.context.offset.unwrap_or(0) as usize;
		let limit = plan.context.limit.map(|limit| limit as usize).unwrap_or(usize::MAX);
		let posts = sorted.into_iter().skip(offset).take(limit).collect();

		Box::pin(async move { Ok(posts) })
	}

	fn first_posts_for_topics<'a>(
		&'a self,
		topic_ids: &'a [i64],
		plan: &'a FilterPlan,
		limit: i64,
	) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		let posts: Vec<Post> = topic_ids
			.iter()
			.filter_map(|topic_id| {
				self.posts
					.iter()
					.find(|post| post.topic_id == *topic_id && post.post_number == 1)
			})
			.filter(|post| {
				self.visible(post)
					&& plan.predicates.iter().all(|predicate| self.matches(post, predicate))
			})
			.take(limit.max(0) as usize)
			.cloned()
			.collect();

		Box::pin(async move { Ok(posts) })
	}

	fn posts_by_ids<'a>(
		&'a self,
		post_ids: &'a [i64],
		plan: &'a FilterPlan,
	) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		let posts: Vec<Post> = post_ids
			.iter()
			.filter_map(|post_id| self.posts.iter().find(|post| post.id == *post_id))
			.filter(|post| {
				self.visible(post)
					&& plan.predicates.iter().all(|predicate| self.matches(post, predicate))
			})
			.cloned()
			.collect();

		Box::pin(async move { Ok(posts) })
	}
}

/// Canned nearest-neighbour results; records each request so tests can
/// assert on over-selection limits and offsets.
#[derive(Default)]
pub struct StaticSimilarityIndex {
	pub topic_ids: Vec<i64>,
	pub post_ids: Vec<i64>,
	pub topic_requests: Mutex<Vec<(u64, u64)>>,
	pub post_requests: Mutex<Vec<u64>>,
}
impl StaticSimilarityIndex {
	pub fn with_topics(topic_ids: Vec<i64>) -> Self {
		Self { topic_ids, ..Default::default() }
	}

	pub fn with_posts(post_ids: Vec<i64>) -> Self {
		Self { post_ids, ..Default::default() }
	}

	pub fn last_topic_request(&self) -> Option<(u64, u64)> {
		lock(&self.topic_requests).last().copied()
	}
}
impl SimilarityIndex for StaticSimilarityIndex {
	fn similar_topics<'a>(
		&'a self,
		_vector: Vec<f32>,
		limit: u64,
		offset: u64,
	) -> BoxFuture<'a, SearchResult<Vec<i64>>> {
		lock(&self.topic_requests).push((limit, offset));

		let ids: Vec<i64> =
			self.topic_ids.iter().skip(offset as usize).take(limit as usize).copied().collect();

		Box::pin(async move { Ok(ids) })
	}

	fn similar_posts<'a>(
		&'a self,
		_vector: Vec<f32>,
		limit: u64,
	) -> BoxFuture<'a, SearchResult<Vec<i64>>> {
		lock(&self.post_requests).push(limit);

		let ids: Vec<i64> = self.post_ids.iter().take(limit as usize).copied().collect();

		Box::pin(async move { Ok(ids) })
	}
}

pub struct AllowAllGuard;
impl PermissionGuard for AllowAllGuard {
	fn filter_allowed<'a>(&'a self, posts: Vec<Post>) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		Box::pin(async move { Ok(posts) })
	}
}

/// Drops posts belonging to the denied topics, like a category-permission
/// check would.
pub struct DenyTopicsGuard {
	pub denied: BTreeSet<i64>,
}
impl PermissionGuard for DenyTopicsGuard {
	fn filter_allowed<'a>(&'a self, posts: Vec<Post>) -> BoxFuture<'a, SearchResult<Vec<Post>>> {
		let allowed: Vec<Post> =
			posts.into_iter().filter(|post| !self.denied.contains(&post.topic_id)).collect();

		Box::pin(async move { Ok(allowed) })
	}
}

pub struct StubCompletion {
	pub response: String,
	pub calls: Arc<AtomicUsize>,
}
impl StubCompletion {
	pub fn new(response: &str) -> Self {
		Self { response: response.to_string(), calls: Arc::new(AtomicUsize::new(0)) }
	}
}
impl CompletionProvider for StubCompletion {
	fn generate<'a>(
		&'a self,
		_cfg: &'a CompletionProviderConfig,
		_messages: &'a [Value],
		_user: Option<&'a str>,
		_feature: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let response = self.response.clone();

		Box::pin(async move { Ok(response) })
	}
}

pub struct StubEmbedding {
	pub vector: Vec<f32>,
	pub calls: Arc<AtomicUsize>,
}
impl StubEmbedding {
	pub fn new(vector: Vec<f32>) -> Self {
		Self { vector, calls: Arc::new(AtomicUsize::new(0)) }
	}
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
		_asymmetric: bool,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors = texts.iter().map(|_| self.vector.clone()).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

/// Scores documents by position in `scores`; missing positions score zero,
/// so tests control the rerank order exactly.
pub struct StubRerank {
	pub scores: Vec<f32>,
	pub calls: Arc<AtomicUsize>,
}
impl StubRerank {
	pub fn new(scores: Vec<f32>) -> Self {
		Self { scores, calls: Arc::new(AtomicUsize::new(0)) }
	}
}
impl RerankProvider for StubRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<RerankedDoc>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let mut ranked: Vec<RerankedDoc> = (0..docs.len())
			.map(|index| RerankedDoc {
				index,
				score: self.scores.get(index).copied().unwrap_or(0.0),
			})
			.collect();

		ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

		Box::pin(async move { Ok(ranked) })
	}
}
