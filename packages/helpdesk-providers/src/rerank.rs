use serde_json::Value;

use crate::{Error, Result};

/// Scores a single pair. Fails instead of defaulting when the provider omits the score.
pub async fn score(
	cfg: &helpdesk_config::ProviderConfig,
	query: &str,
	passage: &str,
) -> Result<f32> {
	let docs = [passage.to_string()];
	let client = crate::client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "model": cfg.model, "query": query, "documents": docs });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	parse_single_score(json)
}

fn results_array(json: &Value) -> Result<&Vec<Value>> {
	json.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::invalid_response("Rerank response is missing results array."))
}

fn item_score(item: &Value) -> Result<f32> {
	item.get("relevance_score")
		.or_else(|| item.get("score"))
		.and_then(|v| v.as_f64())
		.map(|v| v as f32)
		.ok_or_else(|| Error::invalid_response("Rerank result missing score."))
}

fn parse_single_score(json: Value) -> Result<f32> {
	let results = results_array(&json)?;
	let item = results
		.iter()
		.find(|item| item.get("index").and_then(|v| v.as_u64()).unwrap_or(0) == 0)
		.ok_or_else(|| Error::invalid_response("Rerank response has no score for the passage."))?;
	let score = item_score(item)?;

	if !score.is_finite() {
		return Err(Error::invalid_response("Rerank score must be finite."));
	}

	Ok(score)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_single_pair_score() {
		let json = serde_json::json!({ "data": [{ "index": 0, "score": -3.5 }] });
		assert_eq!(parse_single_score(json).expect("parse failed"), -3.5);
	}

	#[test]
	fn single_pair_without_results_fails() {
		let json = serde_json::json!({ "results": [] });
		assert!(parse_single_score(json).is_err());
	}
}
