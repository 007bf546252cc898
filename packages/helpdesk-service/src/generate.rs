use serde_json::Value;

use crate::{HelpdeskService, Result};
use helpdesk_providers::llm::chat_messages;

/// Emitted verbatim when the context cannot support an answer.
pub const REFUSAL_ANSWER: &str =
	"I don't have enough data in my knowledge base for this. Please add more documents.";

/// Section headers every generated answer is instructed to carry, in order.
pub const SECTION_HEADERS: [&str; 4] =
	["Problem Summary:", "Likely Causes:", "Step-by-Step Fix:", "Notes:"];

const ANSWER_SYSTEM_PROMPT: &str = "\
You are a senior IT technician with deep expertise in:
- Windows troubleshooting
- Linux troubleshooting
- Networking (DNS, DHCP, routing, WiFi)
- Hardware diagnostics
- Cybersecurity & malware handling
- Active Directory
- ITSM workflow (tickets, SLAs, documentation)

Rules:
1. Always use ONLY the provided context. If the answer is not in the context, say exactly:
   \"I don't have enough data in my knowledge base for this. Please add more documents.\"
2. Never invent missing information.
3. Think like a technician:
   - Isolate the issue
   - Check the simplest causes first
   - Give exact commands, paths, and logs
4. Keep answers practical, concise, and structured.
5. Use this format:

Problem Summary:
<short explanation>

Likely Causes:
- cause 1
- cause 2

Step-by-Step Fix:
1. ...
2. ...

Notes:
- ...
";

pub fn build_answer_messages(query: &str, context: &str) -> Vec<Value> {
	let user_prompt = format!(
		"CONTEXT:\n{context}\n\nQUESTION:\n{query}\n\n\
Using ONLY the above context, generate a technical answer in the required format."
	);

	chat_messages(ANSWER_SYSTEM_PROMPT, &user_prompt)
}

impl HelpdeskService {
	pub async fn generate_answer(&self, query: &str, context: &str) -> Result<String> {
		let cfg = &self.cfg.providers.llm;
		let messages = build_answer_messages(query, context);

		self.providers.generation.complete(cfg, &messages, Some(cfg.max_tokens)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn system_prompt_carries_refusal_and_headers() {
		assert!(ANSWER_SYSTEM_PROMPT.contains(REFUSAL_ANSWER));

		let mut last = 0;

		for header in SECTION_HEADERS {
			let at = ANSWER_SYSTEM_PROMPT.find(header).expect("header missing from prompt");

			assert!(at > last, "{header} is out of order");

			last = at;
		}
	}

	#[test]
	fn user_prompt_places_context_before_question() {
		let messages = build_answer_messages("Why is DNS slow?", "Flush the resolver cache.");
		let content = messages[1]["content"].as_str().expect("user content");

		assert!(content.find("Flush the resolver cache.") < content.find("Why is DNS slow?"));
		assert!(content.starts_with("CONTEXT:\n"));
	}
}
