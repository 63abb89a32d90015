use std::collections::BTreeSet;

use time::OffsetDateTime;

/// Result presentation order. Post orders sort on the post timestamp alone;
/// topic orders sort on the topic timestamp with the post sequence number as
/// the secondary key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
	#[default]
	LatestPost,
	OldestPost,
	LatestTopic,
	OldestTopic,
}

/// A single candidate-narrowing clause. Name-bearing variants carry raw
/// names; the content store resolves them, and an unknown name yields an
/// empty match for that clause rather than an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
	Open,
	Closed,
	Archived,
	NoReplies,
	SingleUser,
	PostedBefore(OffsetDateTime),
	PostedAfter(OffsetDateTime),
	TopicCreatedBefore(OffsetDateTime),
	TopicCreatedAfter(OffsetDateTime),
	Tagged(Vec<String>),
	InCategories(Vec<String>),
	ByUser(String),
	ByGroup(String),
	Keywords(Vec<String>),
	/// Matches no posts. Produced when a directive is syntactically valid but
	/// can never match, e.g. `topic:abc`.
	Nothing,
}

/// Request-scoped control state accumulated while parsing directives.
#[derive(Clone, Debug, Default)]
pub struct FilterContext {
	pub order: SortOrder,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
	pub forced_topic_ids: BTreeSet<i64>,
	pub invalid_tokens: Vec<String>,
}
impl FilterContext {
	/// Last directive wins.
	pub fn set_order(&mut self, order: SortOrder) {
		self.order = order;
	}

	/// The effective limit is the minimum of every value seen, including any
	/// limit the caller set before parsing.
	pub fn cap_limit(&mut self, limit: u32) {
		self.limit = Some(self.limit.map_or(limit, |current| current.min(limit)));
	}

	/// Forced ids accumulate as a union, never an overwrite.
	pub fn force_topics<I>(&mut self, topic_ids: I)
	where
		I: IntoIterator<Item = i64>,
	{
		self.forced_topic_ids.extend(topic_ids);
	}
}

/// The parsed shape of a query: the free-text remainder, the predicate
/// pipeline, and the control directives.
#[derive(Clone, Debug, Default)]
pub struct FilterPlan {
	/// Tokens no directive claimed, joined in query order with quotes
	/// stripped. The semantic pipeline embeds this text.
	pub term: String,
	pub predicates: Vec<Predicate>,
	pub context: FilterContext,
}
impl FilterPlan {
	/// Whether any predicate directive narrowed the candidate set. Directives
	/// that matched but contributed nothing (e.g. `before:` with an
	/// unparseable date) do not count.
	///
	/// When this is false and forced topic ids exist, the where clause is
	/// exactly topic-id membership; otherwise forced ids are OR-combined with
	/// the predicates so forced topics always appear.
	pub fn narrowed(&self) -> bool {
		!self.predicates.is_empty()
	}

	pub fn invalid_tokens(&self) -> &[String] {
		&self.context.invalid_tokens
	}
}
