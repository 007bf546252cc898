use helpdesk_domain::Passage;

use crate::{HelpdeskService, Result};

impl HelpdeskService {
	/// Scores every passage against `query` and returns them best first. Passages whose scoring
	/// call fails are dropped; the rest are still ranked.
	pub async fn rerank(&self, query: &str, passages: Vec<Passage>) -> Vec<Passage> {
		if passages.is_empty() {
			return passages;
		}

		let cfg = &self.cfg.providers.rerank;
		let mut scored = Vec::with_capacity(passages.len());

		for passage in passages {
			let score = self.providers.scorer.score(cfg, query, &passage.content).await;

			scored.push((score, passage));
		}

		rank_scored(scored)
	}
}

/// Keeps the successfully scored passages, ordered by descending score. Ties keep their
/// retrieval order.
pub fn rank_scored(scored: Vec<(Result<f32>, Passage)>) -> Vec<Passage> {
	let total = scored.len();
	let mut ranked: Vec<(f32, Passage)> = Vec::with_capacity(total);

	for (score, passage) in scored {
		match score {
			Ok(score) if score.is_finite() => ranked.push((score, passage)),
			Ok(score) => {
				tracing::warn!(source = %passage.source, score, "Dropping passage with a non-finite score.");
			},
			Err(err) => {
				tracing::warn!(source = %passage.source, error = %err, "Dropping passage that failed to score.");
			},
		}
	}

	ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

	if ranked.len() < total {
		tracing::debug!(kept = ranked.len(), total, "Rerank finished with partial results.");
	}

	ranked.into_iter().map(|(_, passage)| passage).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Collaborator, Error};

	fn passage(source: &str) -> Passage {
		Passage::new(format!("content {source}"), source)
	}

	fn sources(passages: &[Passage]) -> Vec<&str> {
		passages.iter().map(|p| p.source.as_str()).collect()
	}

	#[test]
	fn orders_by_descending_score() {
		let ranked = rank_scored(vec![
			(Ok(0.1), passage("a")),
			(Ok(2.5), passage("b")),
			(Ok(-1.0), passage("c")),
			(Ok(2.5), passage("d")),
		]);

		assert_eq!(sources(&ranked), vec!["b", "d", "a", "c"]);
	}

	#[test]
	fn drops_failed_and_non_finite_scores() {
		let ranked = rank_scored(vec![
			(Ok(0.4), passage("a")),
			(Err(Error::unavailable(Collaborator::RelevanceScorer, "timeout")), passage("b")),
			(Ok(f32::NAN), passage("c")),
			(Ok(0.9), passage("d")),
		]);

		assert_eq!(sources(&ranked), vec!["d", "a"]);
	}

	#[test]
	fn all_failures_yield_empty_ranking() {
		let ranked = rank_scored(vec![(
			Err(Error::unavailable(Collaborator::RelevanceScorer, "down")),
			passage("a"),
		)]);

		assert!(ranked.is_empty());
	}
}
