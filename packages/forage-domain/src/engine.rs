use time::{Date, OffsetDateTime};

use crate::{
	plan::FilterPlan,
	registry::FilterRegistry,
	tokenize::{strip_quotes, tokenize},
};

/// Parses a raw query string into a [`FilterPlan`] by dispatching each token
/// through the registry. Tokens no directive claims become the free-text
/// search term and are recorded as invalid tokens; they never fail the
/// parse.
pub struct FilterEngine<'a> {
	registry: &'a FilterRegistry,
}
impl<'a> FilterEngine<'a> {
	pub fn new(registry: &'a FilterRegistry) -> Self {
		Self { registry }
	}

	pub fn parse(&self, query: &str) -> FilterPlan {
		self.parse_at(query, OffsetDateTime::now_utc().date())
	}

	/// `today` anchors relative date words such as `before:yesterday`.
	pub fn parse_at(&self, query: &str, today: Date) -> FilterPlan {
		let mut plan = FilterPlan::default();
		let mut term_parts: Vec<String> = Vec::new();

		for token in tokenize(query.trim()) {
			if self.registry.dispatch(&token, today, &mut plan) {
				continue;
			}

			let text = strip_quotes(&token);

			if !text.is_empty() {
				term_parts.push(text);
			}

			plan.context.invalid_tokens.push(token);
		}

		plan.term = term_parts.join(" ");

		plan
	}
}
