use serde_json::Value;

use crate::{Error, Result};

/// Embeds `texts` in one request. The reply must carry exactly one vector per input, returned
/// in input order.
pub async fn embed(
	cfg: &helpdesk_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let json: Value = crate::client(cfg.timeout_ms)?
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	parse_embedding_response(json, texts.len())
}

/// Flattens line breaks and tabs so the encoder sees a single line of text.
pub fn clean_input(text: &str) -> String {
	text.replace(['\n', '\r', '\t'], " ").trim().to_string()
}

fn parse_embedding_response(json: Value, expected: usize) -> Result<Vec<Vec<f32>>> {
	let Some(data) = json.get("data").and_then(Value::as_array) else {
		return Err(Error::invalid_response("Embedding response is missing data array."));
	};

	if data.len() != expected {
		return Err(Error::invalid_response(format!(
			"Embedding response has {} vectors for {expected} inputs.",
			data.len()
		)));
	}

	let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

	for (position, item) in data.iter().enumerate() {
		let index = item.get("index").and_then(Value::as_u64).map_or(position, |v| v as usize);
		let vector = item
			.get("embedding")
			.and_then(Value::as_array)
			.ok_or_else(|| Error::invalid_response("Embedding item missing embedding array."))?
			.iter()
			.map(|value| {
				value
					.as_f64()
					.map(|number| number as f32)
					.ok_or_else(|| Error::invalid_response("Embedding value must be numeric."))
			})
			.collect::<Result<Vec<f32>>>()?;
		let Some(slot) = slots.get_mut(index) else {
			return Err(Error::invalid_response(format!("Embedding index {index} is out of range.")));
		};

		if slot.replace(vector).is_some() {
			return Err(Error::invalid_response(format!("Embedding index {index} is repeated.")));
		}
	}

	slots
		.into_iter()
		.map(|slot| slot.ok_or_else(|| Error::invalid_response("Embedding response skipped an input.")))
		.collect()
}
