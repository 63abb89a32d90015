use time::macros::date;

use forage_domain::{FilterEngine, FilterRegistry, Predicate, SortOrder};

fn parse(query: &str) -> forage_domain::FilterPlan {
	let registry = FilterRegistry::standard();

	FilterEngine::new(&registry).parse_at(query, date!(2024 - 06 - 01))
}

#[test]
fn repeated_max_results_takes_the_minimum() {
	let plan = parse("max_results:30 max_results:10 max_results:20");

	assert_eq!(plan.context.limit, Some(10));
}

#[test]
fn forced_topic_ids_accumulate_as_a_union() {
	let plan = parse("topic:1,2 topic:3");

	assert_eq!(plan.context.forced_topic_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn forced_ids_without_predicates_do_not_narrow() {
	let plan = parse("topic:42");

	assert!(!plan.narrowed());
	assert!(plan.context.forced_topic_ids.contains(&42));
}

#[test]
fn predicates_and_forced_ids_coexist() {
	let plan = parse("tag:foo topic:42");

	assert!(plan.narrowed());
	assert_eq!(plan.predicates, vec![Predicate::Tagged(vec!["foo".to_string()])]);
	assert!(plan.context.forced_topic_ids.contains(&42));
}

#[test]
fn last_order_directive_wins() {
	let plan = parse("order:latest order:oldest_topic");

	assert_eq!(plan.context.order, SortOrder::OldestTopic);
}

#[test]
fn default_order_is_latest_post() {
	assert_eq!(parse("rust").context.order, SortOrder::LatestPost);
}

#[test]
fn unmatched_tokens_become_the_term_and_invalid_list() {
	let plan = parse(r#"tag:art how to "paint walls""#);

	assert_eq!(plan.term, "how to paint walls");
	assert_eq!(plan.invalid_tokens(), &["how", "to", r#""paint walls""#]);
	assert_eq!(plan.predicates.len(), 1);
}

#[test]
fn status_directives_push_predicates_in_query_order() {
	let plan = parse("status:open status:noreplies");

	assert_eq!(plan.predicates, vec![Predicate::Open, Predicate::NoReplies]);
}

#[test]
fn unparseable_date_matches_but_narrows_nothing() {
	let plan = parse("before:someday");

	assert!(!plan.narrowed());
	assert!(plan.invalid_tokens().is_empty());
}

#[test]
fn date_directives_resolve_relative_words() {
	let plan = parse("after:yesterday");

	match plan.predicates.as_slice() {
		[Predicate::PostedAfter(date)] => assert_eq!(date.date(), date!(2024 - 05 - 31)),
		other => panic!("Unexpected predicates: {other:?}"),
	}
}

#[test]
fn non_numeric_topic_id_matches_nothing() {
	let plan = parse("topic:abc");

	assert_eq!(plan.predicates, vec![Predicate::Nothing]);
	assert!(plan.context.forced_topic_ids.is_empty());
}

#[test]
fn tag_lists_split_on_commas() {
	let plan = parse("tags:alpha,beta");

	assert_eq!(
		plan.predicates,
		vec![Predicate::Tagged(vec!["alpha".to_string(), "beta".to_string()])]
	);
}

#[test]
fn username_directive_lowercases() {
	let plan = parse("@Sam");

	assert_eq!(plan.predicates, vec![Predicate::ByUser("sam".to_string())]);
}

#[test]
fn group_directive_captures_the_name() {
	let plan = parse("group:site-staff");

	assert_eq!(plan.predicates, vec![Predicate::ByGroup("site-staff".to_string())]);
}

#[test]
fn keyword_directive_ignores_empty_lists() {
	assert!(!parse("keywords:, ,").narrowed());
	assert_eq!(
		parse("keywords:install,setup").predicates,
		vec![Predicate::Keywords(vec!["install".to_string(), "setup".to_string()])]
	);
}

#[test]
fn directive_patterns_are_case_insensitive() {
	let plan = parse("STATUS:OPEN Order:Oldest");

	assert_eq!(plan.predicates, vec![Predicate::Open]);
	assert_eq!(plan.context.order, SortOrder::OldestPost);
}
