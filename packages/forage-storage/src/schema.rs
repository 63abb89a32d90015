pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_categories.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_categories.sql")),
				"tables/002_users.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_users.sql")),
				"tables/003_groups.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_groups.sql")),
				"tables/004_group_users.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_group_users.sql")),
				"tables/005_tags.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_tags.sql")),
				"tables/006_topics.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_topics.sql")),
				"tables/007_topic_tags.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_topic_tags.sql")),
				"tables/008_posts.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_posts.sql")),
				"tables/009_semantic_cache.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_semantic_cache.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_every_include() {
		let rendered = render_schema();

		assert!(!rendered.contains("\\ir "));
		assert!(rendered.contains("CREATE TABLE IF NOT EXISTS semantic_cache"));
		assert!(rendered.contains("CREATE TABLE IF NOT EXISTS posts"));
	}
}
