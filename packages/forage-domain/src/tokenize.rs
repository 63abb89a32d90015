/// Splits a query on whitespace while keeping double-quoted spans intact, so
/// `tag:art before:"2024 01"` yields two tokens. An unterminated quote runs
/// to the end of the input.
pub fn tokenize(query: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut current = String::new();
	let mut in_quotes = false;

	for ch in query.chars() {
		match ch {
			'"' => {
				in_quotes = !in_quotes;

				current.push(ch);
			},
			ch if ch.is_whitespace() && !in_quotes => {
				if !current.is_empty() {
					tokens.push(std::mem::take(&mut current));
				}
			},
			ch => current.push(ch),
		}
	}

	if !current.is_empty() {
		tokens.push(current);
	}

	tokens
}

/// Drops the quote characters from a token, leaving the span text.
pub(crate) fn strip_quotes(token: &str) -> String {
	token.chars().filter(|ch| *ch != '"').collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_on_whitespace() {
		assert_eq!(tokenize("tag:art order:latest"), vec!["tag:art", "order:latest"]);
	}

	#[test]
	fn preserves_quoted_spans() {
		assert_eq!(
			tokenize(r#"before:"2024 01" rust "exact phrase""#),
			vec![r#"before:"2024 01""#, "rust", r#""exact phrase""#]
		);
	}

	#[test]
	fn handles_unterminated_quote() {
		assert_eq!(tokenize(r#"rust "broken span"#), vec!["rust", r#""broken span"#]);
	}

	#[test]
	fn ignores_repeated_whitespace() {
		assert_eq!(tokenize("  a \t b  "), vec!["a", "b"]);
	}
}
