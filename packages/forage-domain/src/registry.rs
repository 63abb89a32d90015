use regex::Regex;
use time::Date;

use crate::{
	date::word_to_date,
	plan::{FilterPlan, Predicate, SortOrder},
	tokenize::strip_quotes,
};

/// Directive handlers receive the first capture group (quotes stripped,
/// empty when the pattern has none) and either push a predicate or mutate
/// the plan's control context.
pub type Apply = fn(&str, Date, &mut FilterPlan);

/// One recognized query-token rule: a pattern and the handler it dispatches
/// to.
pub struct Directive {
	pattern: Regex,
	apply: Apply,
}
impl Directive {
	fn try_apply(&self, token: &str, today: Date, plan: &mut FilterPlan) -> bool {
		let Some(caps) = self.pattern.captures(token) else {
			return false;
		};
		let captured = caps.get(1).map(|group| group.as_str()).unwrap_or("");

		(self.apply)(strip_quotes(captured).as_str(), today, plan);

		true
	}
}

/// An immutable, ordered directive list. Order is fixed at build time and is
/// significant: the first directive whose pattern matches claims the token.
/// Built once at process start and shared by reference; concurrent reads are
/// safe without locking.
#[derive(Default)]
pub struct FilterRegistry {
	directives: Vec<Directive>,
}
impl FilterRegistry {
	/// The built-in directive set, in registration order. Every pattern is a
	/// literal known to compile; a failure here is a programming error.
	pub fn standard() -> Self {
		let directives: [(&str, Apply); 20] = [
			(r"(?i)^status:open$", |_, _, plan| {
				plan.predicates.push(Predicate::Open);
			}),
			(r"(?i)^status:closed$", |_, _, plan| {
				plan.predicates.push(Predicate::Closed);
			}),
			(r"(?i)^status:archived$", |_, _, plan| {
				plan.predicates.push(Predicate::Archived);
			}),
			(r"(?i)^status:noreplies$", |_, _, plan| {
				plan.predicates.push(Predicate::NoReplies);
			}),
			(r"(?i)^status:single_user$", |_, _, plan| {
				plan.predicates.push(Predicate::SingleUser);
			}),
			(r"(?i)^before:(.*)$", |raw, today, plan| {
				if let Some(date) = word_to_date(raw, today) {
					plan.predicates.push(Predicate::PostedBefore(date));
				}
			}),
			(r"(?i)^after:(.*)$", |raw, today, plan| {
				if let Some(date) = word_to_date(raw, today) {
					plan.predicates.push(Predicate::PostedAfter(date));
				}
			}),
			(r"(?i)^topic_before:(.*)$", |raw, today, plan| {
				if let Some(date) = word_to_date(raw, today) {
					plan.predicates.push(Predicate::TopicCreatedBefore(date));
				}
			}),
			(r"(?i)^topic_after:(.*)$", |raw, today, plan| {
				if let Some(date) = word_to_date(raw, today) {
					plan.predicates.push(Predicate::TopicCreatedAfter(date));
				}
			}),
			(r"(?i)^tags?:(.*)$", |raw, _, plan| {
				let names = split_names(raw);

				if names.is_empty() {
					plan.predicates.push(Predicate::Nothing);
				} else {
					plan.predicates.push(Predicate::Tagged(names));
				}
			}),
			(r"(?i)^keywords?:(.*)$", |raw, _, plan| {
				let keywords = split_names(raw);

				// An empty keyword list narrows nothing.
				if !keywords.is_empty() {
					plan.predicates.push(Predicate::Keywords(keywords));
				}
			}),
			(r"(?i)^categor(?:y|ies):(.*)$", |raw, _, plan| {
				let names = split_names(raw);

				if names.is_empty() {
					plan.predicates.push(Predicate::Nothing);
				} else {
					plan.predicates.push(Predicate::InCategories(names));
				}
			}),
			(r"(?i)^@(\w+)$", |raw, _, plan| {
				plan.predicates.push(Predicate::ByUser(raw.to_lowercase()));
			}),
			(r"(?i)^group:([a-zA-Z0-9_\-]+)$", |raw, _, plan| {
				plan.predicates.push(Predicate::ByGroup(raw.to_string()));
			}),
			(r"(?i)^max_results:(\d+)$", |raw, _, plan| {
				if let Ok(limit) = raw.parse::<u32>() {
					plan.context.cap_limit(limit);
				}
			}),
			(r"(?i)^order:latest$", |_, _, plan| {
				plan.context.set_order(SortOrder::LatestPost);
			}),
			(r"(?i)^order:oldest$", |_, _, plan| {
				plan.context.set_order(SortOrder::OldestPost);
			}),
			(r"(?i)^order:latest_topic$", |_, _, plan| {
				plan.context.set_order(SortOrder::LatestTopic);
			}),
			(r"(?i)^order:oldest_topic$", |_, _, plan| {
				plan.context.set_order(SortOrder::OldestTopic);
			}),
			(r"(?i)^topics?:(.*)$", |raw, _, plan| {
				let topic_ids: Vec<i64> = raw
					.split(',')
					.filter_map(|part| part.trim().parse::<i64>().ok())
					.filter(|id| *id > 0)
					.collect();

				if topic_ids.is_empty() {
					plan.predicates.push(Predicate::Nothing);
				} else {
					plan.context.force_topics(topic_ids);
				}
			}),
		];
		let mut registry = Self::default();

		for (pattern, apply) in directives {
			let registered = registry.register(pattern, apply);

			debug_assert!(registered.is_ok(), "Built-in directive pattern failed to compile.");
		}

		registry
	}

	/// Appends a directive. Registration order equals dispatch order. An
	/// unparseable pattern is an error, never a silent drop, so dispatch
	/// order stays exactly the registration order the caller wrote.
	pub fn register(&mut self, pattern: &str, apply: Apply) -> Result<(), regex::Error> {
		let pattern = Regex::new(pattern)?;

		self.directives.push(Directive { pattern, apply });

		Ok(())
	}

	/// Dispatches one token to the first matching directive. Returns false
	/// when no directive claims the token.
	pub fn dispatch(&self, token: &str, today: Date, plan: &mut FilterPlan) -> bool {
		self.directives.iter().any(|directive| directive.try_apply(token, today, plan))
	}

	pub fn len(&self) -> usize {
		self.directives.len()
	}

	pub fn is_empty(&self) -> bool {
		self.directives.is_empty()
	}
}

fn split_names(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|name| !name.is_empty())
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn standard_registry_registers_every_directive() {
		assert_eq!(FilterRegistry::standard().len(), 20);
	}

	#[test]
	fn register_rejects_unparseable_patterns() {
		let mut registry = FilterRegistry::default();

		assert!(registry.register(r"^status:(", |_, _, _| {}).is_err());
		assert!(registry.is_empty());
	}
}
