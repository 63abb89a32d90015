use forage_domain::plan::{FilterPlan, Predicate, SortOrder};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{Result, models::Post};

const POST_COLUMNS: &str = "posts.id, posts.topic_id, posts.user_id, posts.post_number, \
	posts.raw, posts.cooked, posts.created_at";

/// Postgres-backed post retrieval. Every query starts from the same base
/// visibility clause; a plan's predicates, forced topic ids, limit, offset
/// and order are layered on top in that order.
pub struct PgContentStore {
	pub pool: PgPool,
}
impl PgContentStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Lexical filtered search: visibility, predicates, forced-id merge,
	/// limit, offset, order.
	pub async fn filtered_posts(&self, plan: &FilterPlan) -> Result<Vec<Post>> {
		let mut builder = base_query();

		push_plan_clauses(&mut builder, plan);

		if let Some(limit) = plan.context.limit
			&& limit > 0
		{
			builder.push(" LIMIT ");
			builder.push_bind(limit as i64);
		}
		if let Some(offset) = plan.context.offset
			&& offset > 0
		{
			builder.push(" OFFSET ");
			builder.push_bind(offset as i64);
		}

		let posts = builder.build_query_as().fetch_all(&self.pool).await?;

		Ok(posts)
	}

	/// First post of each listed topic, in exactly the order the ids were
	/// given. Topics the plan's predicates reject are dropped without
	/// disturbing the order of the rest.
	pub async fn first_posts_for_topics(
		&self,
		topic_ids: &[i64],
		plan: &FilterPlan,
		limit: i64,
	) -> Result<Vec<Post>> {
		if topic_ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
			"SELECT {POST_COLUMNS} \
			FROM posts \
			JOIN topics ON topics.id = posts.topic_id \
			JOIN unnest("
		));

		builder.push_bind(topic_ids.to_vec());
		builder.push(
			"::bigint[]) WITH ORDINALITY AS ranked (topic_id, rank) \
			ON ranked.topic_id = posts.topic_id \
			WHERE topics.visible = TRUE AND posts.deleted_at IS NULL AND posts.post_number = 1",
		);

		for predicate in &plan.predicates {
			builder.push(" AND (");
			push_predicate(&mut builder, predicate);
			builder.push(")");
		}

		builder.push(" ORDER BY ranked.rank LIMIT ");
		builder.push_bind(limit);

		let posts = builder.build_query_as().fetch_all(&self.pool).await?;

		Ok(posts)
	}

	/// Posts by id, in exactly the order the ids were given.
	pub async fn posts_by_ids(&self, post_ids: &[i64], plan: &FilterPlan) -> Result<Vec<Post>> {
		if post_ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
			"SELECT {POST_COLUMNS} \
			FROM posts \
			JOIN topics ON topics.id = posts.topic_id \
			JOIN unnest("
		));

		builder.push_bind(post_ids.to_vec());
		builder.push(
			"::bigint[]) WITH ORDINALITY AS ranked (post_id, rank) \
			ON ranked.post_id = posts.id \
			WHERE topics.visible = TRUE AND posts.deleted_at IS NULL",
		);

		for predicate in &plan.predicates {
			builder.push(" AND (");
			push_predicate(&mut builder, predicate);
			builder.push(")");
		}

		builder.push(" ORDER BY ranked.rank");

		let posts = builder.build_query_as().fetch_all(&self.pool).await?;

		Ok(posts)
	}
}

fn base_query() -> QueryBuilder<'static, Postgres> {
	QueryBuilder::new(format!(
		"SELECT {POST_COLUMNS} \
		FROM posts \
		JOIN topics ON topics.id = posts.topic_id \
		WHERE topics.visible = TRUE AND posts.deleted_at IS NULL"
	))
}

/// Predicates, then the forced-id merge, then the order clause. When forced
/// topic ids exist and nothing narrowed, the where clause is exactly topic-id
/// membership; when predicates narrowed, forced topics are OR-combined so
/// they always appear.
fn push_plan_clauses(builder: &mut QueryBuilder<'_, Postgres>, plan: &FilterPlan) {
	let forced: Vec<i64> = plan.context.forced_topic_ids.iter().copied().collect();

	if forced.is_empty() {
		for predicate in &plan.predicates {
			builder.push(" AND (");
			push_predicate(builder, predicate);
			builder.push(")");
		}
	} else if !plan.narrowed() {
		builder.push(" AND posts.topic_id = ANY(");
		builder.push_bind(forced);
		builder.push(")");
	} else {
		builder.push(" AND (posts.topic_id = ANY(");
		builder.push_bind(forced);
		builder.push(")");

		builder.push(" OR (");
		for (i, predicate) in plan.predicates.iter().enumerate() {
			if i > 0 {
				builder.push(" AND ");
			}
			builder.push("(");
			push_predicate(builder, predicate);
			builder.push(")");
		}
		builder.push("))");
	}

	builder.push(match plan.context.order {
		SortOrder::LatestPost => " ORDER BY posts.created_at DESC",
		SortOrder::OldestPost => " ORDER BY posts.created_at ASC",
		SortOrder::LatestTopic => " ORDER BY topics.created_at DESC, posts.post_number DESC",
		SortOrder::OldestTopic => " ORDER BY topics.created_at ASC, posts.post_number ASC",
	});
}

/// Renders one predicate as a SQL condition. Name-bearing predicates resolve
/// through subselects; an unknown tag, category, user or group yields an
/// empty subselect and therefore an empty match for the clause.
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
	match predicate {
		Predicate::Open => {
			builder.push("topics.closed = FALSE AND topics.archived = FALSE");
		},
		Predicate::Closed => {
			builder.push("topics.closed = TRUE");
		},
		Predicate::Archived => {
			builder.push("topics.archived = TRUE");
		},
		Predicate::NoReplies => {
			builder.push("topics.posts_count = 1");
		},
		Predicate::SingleUser => {
			builder.push("topics.participant_count = 1");
		},
		Predicate::PostedBefore(date) => {
			builder.push("posts.created_at < ");
			builder.push_bind(*date);
		},
		Predicate::PostedAfter(date) => {
			builder.push("posts.created_at > ");
			builder.push_bind(*date);
		},
		Predicate::TopicCreatedBefore(date) => {
			builder.push("topics.created_at < ");
			builder.push_bind(*date);
		},
		Predicate::TopicCreatedAfter(date) => {
			builder.push("topics.created_at > ");
			builder.push_bind(*date);
		},
		Predicate::Tagged(names) => {
			builder.push(
				"posts.topic_id IN (\
				SELECT topic_tags.topic_id FROM topic_tags \
				JOIN tags ON tags.id = topic_tags.tag_id \
				WHERE tags.name = ANY(",
			);
			builder.push_bind(names.clone());
			builder.push("))");
		},
		Predicate::InCategories(names) => {
			builder.push(
				"topics.category_id IN (\
				SELECT categories.id FROM categories WHERE categories.slug = ANY(",
			);
			builder.push_bind(names.clone());
			builder.push(") OR categories.name = ANY(");
			builder.push_bind(names.clone());
			builder.push("))");
		},
		Predicate::ByUser(username) => {
			builder
				.push("posts.user_id IN (SELECT users.id FROM users WHERE lower(users.username) = ");
			builder.push_bind(username.clone());
			builder.push(")");
		},
		Predicate::ByGroup(name) => {
			builder.push(
				"posts.user_id IN (\
				SELECT group_users.user_id FROM group_users \
				JOIN groups ON groups.id = group_users.group_id \
				WHERE groups.name ILIKE ",
			);
			builder.push_bind(name.clone());
			builder.push(")");
		},
		Predicate::Keywords(words) => {
			builder.push("to_tsvector('english', posts.raw) @@ to_tsquery('english', ");
			builder.push_bind(ts_query(words));
			builder.push(")");
		},
		Predicate::Nothing => {
			builder.push("1 = 0");
		},
	}
}

/// OR-joined full-text query. Quote and backslash characters would change
/// the tsquery grammar, so they become spaces.
fn ts_query(words: &[String]) -> String {
	words
		.iter()
		.map(|word| word.replace(['\'', '\\'], " ").trim().to_string())
		.filter(|word| !word.is_empty())
		.collect::<Vec<_>>()
		.join(" | ")
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use forage_domain::plan::FilterContext;
	use time::macros::datetime;

	use super::*;

	fn sql_of(plan: &FilterPlan) -> String {
		let mut builder = base_query();

		push_plan_clauses(&mut builder, plan);

		builder.sql().to_string()
	}

	#[test]
	fn forced_ids_alone_become_pure_membership() {
		let plan = FilterPlan {
			context: FilterContext {
				forced_topic_ids: BTreeSet::from([42]),
				..Default::default()
			},
			..Default::default()
		};
		let sql = sql_of(&plan);

		assert!(sql.contains("AND posts.topic_id = ANY($1)"));
		assert!(!sql.contains(" OR "));
	}

	#[test]
	fn forced_ids_with_predicates_are_or_combined() {
		let plan = FilterPlan {
			predicates: vec![Predicate::Tagged(vec!["urgent".to_string()])],
			context: FilterContext {
				forced_topic_ids: BTreeSet::from([42]),
				..Default::default()
			},
			..Default::default()
		};
		let sql = sql_of(&plan);

		assert!(sql.contains("(posts.topic_id = ANY($1) OR ("));
	}

	#[test]
	fn predicates_without_forced_ids_are_and_chained() {
		let plan = FilterPlan {
			predicates: vec![Predicate::Open, Predicate::PostedAfter(datetime!(2025-01-01 0:00 UTC))],
			..Default::default()
		};
		let sql = sql_of(&plan);

		assert!(sql.contains("AND (topics.closed = FALSE AND topics.archived = FALSE)"));
		assert!(sql.contains("AND (posts.created_at > $1)"));
	}

	#[test]
	fn order_clause_follows_plan_order() {
		let plan = FilterPlan {
			context: FilterContext { order: SortOrder::OldestTopic, ..Default::default() },
			..Default::default()
		};

		assert!(
			sql_of(&plan).ends_with("ORDER BY topics.created_at ASC, posts.post_number ASC")
		);
	}

	#[test]
	fn ts_query_joins_with_or_and_drops_grammar_characters() {
		let words = vec!["rust".to_string(), "bo'rrow".to_string(), " ".to_string()];

		assert_eq!(ts_query(&words), "rust | bo rrow");
	}
}
