/// Drops HTML tags, keeping text content. Rendered posts are trusted markup
/// from the forum's own renderer, so a tag-skipping scan is enough here.
pub fn plain_text_of(html: &str) -> String {
	let mut out = String::with_capacity(html.len());
	let mut in_tag = false;

	for c in html.chars() {
		match c {
			'<' => in_tag = true,
			'>' if in_tag => {
				in_tag = false;

				// Block-level boundaries should not glue words together.
				if !out.ends_with(char::is_whitespace) && !out.is_empty() {
					out.push(' ');
				}
			},
			_ if !in_tag => out.push(c),
			_ => {},
		}
	}

	out.trim().to_string()
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
	match text.char_indices().nth(max) {
		Some((index, _)) => text[..index].to_string(),
		None => text.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_tags_and_separates_blocks() {
		let html = "<p>first paragraph</p><p>second one</p>";

		assert_eq!(plain_text_of(html), "first paragraph second one");
	}

	#[test]
	fn keeps_plain_text_untouched() {
		assert_eq!(plain_text_of("no markup here"), "no markup here");
	}

	#[test]
	fn truncates_on_character_boundaries() {
		assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
		assert_eq!(truncate_chars("short", 2000), "short");
	}
}
