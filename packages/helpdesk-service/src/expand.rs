use serde_json::Value;

use crate::HelpdeskService;
use helpdesk_providers::llm::chat_messages;

const EXPANSION_SYSTEM_PROMPT: &str = "You rewrite terse IT-support queries into complete \
technical questions. Reply with the rewritten question only, without quotes, labels, or \
explanations.";

pub fn build_expansion_messages(query: &str) -> Vec<Value> {
	let user_prompt = format!(
		"Expand the following short query into a full, meaningful technical question.\n\
Make it detailed but not irrelevant.\n\nQuery: \"{query}\"\n\nExpanded:"
	);

	chat_messages(EXPANSION_SYSTEM_PROMPT, &user_prompt)
}

/// Strips the echo artifacts models tend to add around a rewritten query.
pub fn clean_expansion(raw: &str) -> Option<String> {
	let mut text = raw.trim();

	if let Some(rest) = text.strip_prefix("Expanded:") {
		text = rest.trim();
	}

	let text = text.trim_matches(|c| c == '"' || c == '\'').trim();

	if text.is_empty() { None } else { Some(text.to_string()) }
}

impl HelpdeskService {
	/// Rewrites `query` into a fuller question. Falls back to `query` when the generation call
	/// fails or returns nothing usable, so the search input is never empty.
	pub async fn expand_query(&self, query: &str) -> String {
		let messages = build_expansion_messages(query);
		let raw = match self
			.providers
			.generation
			.complete(&self.cfg.providers.llm, &messages, None)
			.await
		{
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Query expansion failed; keeping the current query.");

				return query.to_string();
			},
		};

		match clean_expansion(&raw) {
			Some(expanded) => {
				tracing::debug!(original = query, expanded = %expanded, "Query expanded.");

				expanded
			},
			None => {
				tracing::warn!("Query expansion returned no text; keeping the current query.");

				query.to_string()
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expansion_prompt_quotes_the_query() {
		let messages = build_expansion_messages("printer jam");

		assert_eq!(messages.len(), 2);
		assert_eq!(messages[0]["role"], "system");
		assert!(messages[1]["content"].as_str().is_some_and(|c| c.contains("\"printer jam\"")));
	}

	#[test]
	fn clean_expansion_strips_labels_and_quotes() {
		assert_eq!(
			clean_expansion("Expanded: \"How do I clear a paper jam in an office printer?\"\n"),
			Some("How do I clear a paper jam in an office printer?".to_string())
		);
		assert_eq!(clean_expansion("  \"\"  "), None);
		assert_eq!(clean_expansion(""), None);
	}
}
