use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Calls a chat-completions endpoint and returns the raw assistant text.
/// `feature` is forwarded as request metadata so provider-side usage can be
/// attributed per feature.
pub async fn generate(
	cfg: &forage_config::CompletionProviderConfig,
	messages: &[Value],
	user: Option<&str>,
	feature: &str,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
		"metadata": { "feature": feature },
	});

	if let (Some(user), Some(map)) = (user, body.as_object_mut()) {
		map.insert("user".to_string(), Value::String(user.to_string()));
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_response(json)
}

fn parse_completion_response(json: Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| eyre::eyre!("Completion response is missing message content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "<ai>a hypothetical post</ai>" } }
			]
		});
		let text = parse_completion_response(json).expect("parse failed");

		assert_eq!(text, "<ai>a hypothetical post</ai>");
	}

	#[test]
	fn rejects_missing_content() {
		let json = serde_json::json!({ "choices": [] });

		assert!(parse_completion_response(json).is_err());
	}
}
