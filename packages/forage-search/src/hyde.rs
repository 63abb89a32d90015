use forage_config::Site;
use serde_json::Value;

use crate::{SearchResult, SemanticSearch};

pub(crate) const HYDE_FEATURE: &str = "semantic_search_hyde";

impl SemanticSearch {
	/// Asks the completion model to write a plausible forum post for the
	/// term. The embedded document then stands in for the query during
	/// similarity search.
	pub(crate) async fn hypothetical_post_from(&self, term: &str) -> SearchResult<String> {
		let messages = hyde_prompt(&self.cfg.site, term);
		let response = self
			.providers
			.completion
			.generate(&self.cfg.providers.completion, &messages, None, HYDE_FEATURE)
			.await?;

		Ok(extract_tagged(&response))
	}
}

fn hyde_prompt(site: &Site, term: &str) -> Vec<Value> {
	let system = format!(
		"You are a content creator for a forum. The forum description is as follows:\n\
		{}\n{}\n\n\
		Put the forum post between <ai></ai> tags.",
		site.title, site.description
	);
	let user = format!(
		"Using this description, write a forum post about the subject inside the \
		<input></input> XML tags:\n\n<input>{term}</input>"
	);

	vec![
		serde_json::json!({ "role": "system", "content": system }),
		serde_json::json!({ "role": "user", "content": user }),
	]
}

/// Pulls the span between `<ai>` and `</ai>`. Models sometimes answer
/// without the tags, in which case the whole response is used as-is.
fn extract_tagged(response: &str) -> String {
	let Some(start) = response.find("<ai>") else {
		return response.to_string();
	};
	let rest = &response[start + "<ai>".len()..];
	let Some(end) = rest.find("</ai>") else {
		return response.to_string();
	};
	let span = rest[..end].trim();

	if span.is_empty() { response.to_string() } else { span.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_the_delimited_span() {
		let response = "sure!\n<ai>\nA post about lifetimes.\n</ai>\nhope that helps";

		assert_eq!(extract_tagged(response), "A post about lifetimes.");
	}

	#[test]
	fn falls_back_to_the_raw_response() {
		assert_eq!(extract_tagged("A post without tags."), "A post without tags.");
		assert_eq!(extract_tagged("<ai>unclosed"), "<ai>unclosed");
		assert_eq!(extract_tagged("<ai> </ai>"), "<ai> </ai>");
	}

	#[test]
	fn prompt_carries_site_identity_and_term() {
		let site =
			Site { title: "Rustaceans".to_string(), description: "All things Rust.".to_string() };
		let messages = hyde_prompt(&site, "borrow checker");

		assert_eq!(messages.len(), 2);
		assert!(messages[0]["content"].as_str().unwrap().contains("Rustaceans"));
		assert!(messages[0]["content"].as_str().unwrap().contains("All things Rust."));
		assert!(messages[1]["content"].as_str().unwrap().contains("<input>borrow checker</input>"));
	}
}
