use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::{HelpdeskService, REFUSAL_ANSWER};
use helpdesk_domain::{Category, Passage, query};

/// Candidates requested from the index per search call.
pub const SEARCH_K: u32 = 15;
/// Fewer results than this counts as weak retrieval and triggers the retry.
pub const MIN_RESULTS: usize = 2;
pub const MAX_RETRIEVAL_RETRIES: usize = 1;
/// Passages that make it into the generation context.
pub const CONTEXT_TOP_N: usize = 3;
pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found.";
pub const EMPTY_QUERY_ANSWER: &str =
	"Please enter a question describing the IT issue you need help with.";

const CONTEXT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
	pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
	pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Normalizing,
	Expanding,
	Retrieving,
	Retrying,
	Reranking,
	Boosting,
	Assembling,
	Generating,
	Done,
}
impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Normalizing => "normalizing",
			Self::Expanding => "expanding",
			Self::Retrieving => "retrieving",
			Self::Retrying => "retrying",
			Self::Reranking => "reranking",
			Self::Boosting => "boosting",
			Self::Assembling => "assembling",
			Self::Generating => "generating",
			Self::Done => "done",
		}
	}
}

/// What one pipeline run did, in order. Used for logging and by tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnswerTrace {
	pub stages: Vec<Stage>,
	pub final_query: Option<String>,
	pub category: Option<Category>,
	pub expansions: usize,
	pub search_calls: usize,
	pub retrieved: usize,
	pub ranked: usize,
	pub context_sources: Vec<String>,
	pub degraded: bool,
}
impl AnswerTrace {
	fn enter(&mut self, stage: Stage) {
		tracing::debug!(stage = stage.as_str(), "Entering pipeline stage.");

		self.stages.push(stage);
	}

	fn finish(mut self, answer: impl Into<String>) -> AnswerOutcome {
		self.enter(Stage::Done);

		AnswerOutcome { answer: answer.into(), trace: self }
	}

	fn degrade(mut self) -> AnswerOutcome {
		self.degraded = true;

		self.finish(REFUSAL_ANSWER)
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
	pub answer: String,
	pub trace: AnswerTrace,
}

/// Joins the top passages into the generation context, or returns the sentinel when nothing
/// survived ranking.
pub fn assemble_context(passages: &[Passage]) -> String {
	if passages.is_empty() {
		return NO_CONTEXT_SENTINEL.to_string();
	}

	passages
		.iter()
		.take(CONTEXT_TOP_N)
		.map(|passage| passage.content.as_str())
		.collect::<Vec<_>>()
		.join(CONTEXT_SEPARATOR)
}

impl HelpdeskService {
	pub async fn ask(&self, req: AskRequest) -> AskResponse {
		let request_id = uuid::Uuid::new_v4();
		let span = tracing::info_span!("ask", %request_id);
		let answer = self.answer(&req.question).instrument(span).await;

		AskResponse { answer }
	}

	/// Answers a support question. Never fails: collaborator outages surface as a displayable
	/// refusal instead of an error.
	pub async fn answer(&self, question: &str) -> String {
		self.answer_traced(question).await.answer
	}

	pub async fn answer_traced(&self, question: &str) -> AnswerOutcome {
		let mut trace = AnswerTrace::default();

		trace.enter(Stage::Normalizing);

		let Some(normalized) = query::normalize(question) else {
			tracing::info!("Empty query; returning the empty-query message.");

			return trace.finish(EMPTY_QUERY_ANSWER);
		};
		let mut working = normalized.to_string();

		if query::is_short(&working) {
			trace.enter(Stage::Expanding);

			working = self.expand_query(&working).await;
			trace.expansions += 1;
		}

		let mut retries = 0;
		let passages = loop {
			trace.enter(Stage::Retrieving);

			let passages = match self.index.search(&working, SEARCH_K).await {
				Ok(passages) => passages,
				Err(err) => {
					tracing::warn!(error = %err, "Search failed; answering with the refusal.");

					trace.search_calls += 1;
					trace.final_query = Some(working);

					return trace.degrade();
				},
			};

			trace.search_calls += 1;

			if passages.len() >= MIN_RESULTS || retries >= MAX_RETRIEVAL_RETRIES {
				break passages;
			}

			retries += 1;

			tracing::info!(
				results = passages.len(),
				retry = retries,
				"Weak retrieval; expanding the query and searching again."
			);
			trace.enter(Stage::Retrying);

			working = self.expand_query(&working).await;
			trace.expansions += 1;
		};

		trace.retrieved = passages.len();

		trace.enter(Stage::Reranking);

		let ranked = self.rerank(&working, passages).await;

		trace.ranked = ranked.len();

		trace.enter(Stage::Boosting);

		let category = self.booster.classify(&working);
		let boosted = self.booster.boost_for(category, ranked);

		trace.category = Some(category);

		trace.enter(Stage::Assembling);

		let context = assemble_context(&boosted);

		trace.context_sources =
			boosted.iter().take(CONTEXT_TOP_N).map(|passage| passage.source.clone()).collect();

		tracing::info!(
			category = category.as_str(),
			retrieved = trace.retrieved,
			ranked = trace.ranked,
			context_passages = trace.context_sources.len(),
			"Context assembled."
		);

		trace.enter(Stage::Generating);

		let generated = self.generate_answer(&working, &context).await;

		trace.final_query = Some(working);

		match generated {
			Ok(answer) => trace.finish(answer),
			Err(err) => {
				tracing::warn!(error = %err, "Answer generation failed; answering with the refusal.");

				trace.degrade()
			},
		}
	}
}
