use time::{Date, Duration, OffsetDateTime, Time, format_description::well_known::Iso8601};

/// Resolves a date word from a `before:`/`after:` style directive into a UTC
/// midnight timestamp. Accepts `YYYY-MM-DD`, a bare day count (days before
/// `today`), and the words `yesterday`, `week`, `month`, `year`. Returns
/// `None` for anything else; the caller skips the clause in that case.
pub fn word_to_date(word: &str, today: Date) -> Option<OffsetDateTime> {
	let word = word.trim();

	if word.is_empty() {
		return None;
	}

	let date = match word.to_ascii_lowercase().as_str() {
		"yesterday" => today.checked_sub(Duration::days(1))?,
		"week" => today.checked_sub(Duration::days(7))?,
		"month" => today.checked_sub(Duration::days(30))?,
		"year" => today.checked_sub(Duration::days(365))?,
		other =>
			if let Ok(days) = other.parse::<i64>() {
				today.checked_sub(Duration::days(days))?
			} else {
				Date::parse(other, &Iso8601::DATE).ok()?
			},
	};

	Some(date.with_time(Time::MIDNIGHT).assume_utc())
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	#[test]
	fn parses_absolute_dates() {
		let parsed = word_to_date("2024-03-01", date!(2024 - 06 - 01)).expect("date");

		assert_eq!(parsed.date(), date!(2024 - 03 - 01));
	}

	#[test]
	fn parses_relative_words() {
		let today = date!(2024 - 06 - 01);

		assert_eq!(word_to_date("yesterday", today).expect("date").date(), date!(2024 - 05 - 31));
		assert_eq!(word_to_date("week", today).expect("date").date(), date!(2024 - 05 - 25));
		assert_eq!(word_to_date("3", today).expect("date").date(), date!(2024 - 05 - 29));
	}

	#[test]
	fn rejects_unparseable_words() {
		assert!(word_to_date("soonish", date!(2024 - 06 - 01)).is_none());
		assert!(word_to_date("", date!(2024 - 06 - 01)).is_none());
	}
}
