//! In-memory collaborators for exercising the answer pipeline without network services.
//!
//! Every fake appends to a shared [`CallLog`], so tests can assert both how often and in which
//! order the pipeline reached each collaborator.

use std::{
	collections::{HashMap, HashSet, VecDeque},
	sync::{Arc, Mutex},
};

use serde_json::{Map, Value};

use helpdesk_config::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig, Providers, Qdrant,
	Service, Storage,
};
use helpdesk_domain::Passage;
use helpdesk_service::{
	BoxFuture, Collaborator, EmbeddingProvider, Error, GenerationProvider, HelpdeskService,
	EmbeddingIndex, NO_CONTEXT_SENTINEL, REFUSAL_ANSWER, RelevanceScorer, Result, SECTION_HEADERS,
	SearchIndex, VectorStore,
};

pub const VECTOR_DIM: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
	Expand { query: String },
	Search { query: String, k: u32 },
	Embed { text: String },
	Nearest { k: u32 },
	Score { passage: String },
	Answer { query: String, context: String, max_tokens: Option<u32> },
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);
impl CallLog {
	pub fn calls(&self) -> Vec<Call> {
		self.0.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn searches(&self) -> Vec<String> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Search { query, .. } => Some(query),
				_ => None,
			})
			.collect()
	}

	pub fn expansions(&self) -> Vec<String> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Expand { query } => Some(query),
				_ => None,
			})
			.collect()
	}

	pub fn answers(&self) -> Vec<(String, String)> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				Call::Answer { query, context, .. } => Some((query, context)),
				_ => None,
			})
			.collect()
	}

	pub fn scores(&self) -> usize {
		self.calls().iter().filter(|call| matches!(call, Call::Score { .. })).count()
	}

	fn push(&self, call: Call) {
		self.0.lock().unwrap_or_else(|err| err.into_inner()).push(call);
	}
}

/// Search results are served from a queue, one entry per call. Once the queue is drained every
/// further search returns no passages.
pub struct ScriptedIndex {
	log: CallLog,
	script: Mutex<VecDeque<std::result::Result<Vec<Passage>, String>>>,
}
impl ScriptedIndex {
	fn next(&self, k: u32) -> Result<Vec<Passage>> {
		match self.script.lock().unwrap_or_else(|err| err.into_inner()).pop_front() {
			Some(Ok(mut passages)) => {
				passages.truncate(k as usize);

				Ok(passages)
			},
			Some(Err(message)) => Err(Error::unavailable(Collaborator::SearchIndex, message)),
			None => Ok(Vec::new()),
		}
	}
}

impl SearchIndex for ScriptedIndex {
	fn search<'a>(&'a self, query: &'a str, k: u32) -> BoxFuture<'a, Result<Vec<Passage>>> {
		self.log.push(Call::Search { query: query.to_string(), k });

		let result = self.next(k);

		Box::pin(async move { result })
	}
}

impl VectorStore for ScriptedIndex {
	fn vector_dim(&self) -> u32 {
		VECTOR_DIM
	}

	fn nearest<'a>(&'a self, _vector: Vec<f32>, k: u32) -> BoxFuture<'a, Result<Vec<Passage>>> {
		self.log.push(Call::Nearest { k });

		let result = self.next(k);

		Box::pin(async move { result })
	}
}

/// Scores passages by exact content lookup; unknown passages score zero.
pub struct SpyScorer {
	log: CallLog,
	scores: HashMap<String, f32>,
	failing: HashSet<String>,
}
impl RelevanceScorer for SpyScorer {
	fn score<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		passage: &'a str,
	) -> BoxFuture<'a, Result<f32>> {
		self.log.push(Call::Score { passage: passage.to_string() });

		let result = if self.failing.contains(passage) {
			Err(Error::unavailable(Collaborator::RelevanceScorer, "scorer timed out"))
		} else {
			Ok(self.scores.get(passage).copied().unwrap_or(0.0))
		};

		Box::pin(async move { result })
	}
}

/// Answers expansion prompts with `"<query> help needed"` and answer prompts with a
/// structured report, or the refusal when the context is the sentinel.
pub struct SpyGenerator {
	log: CallLog,
	fail_expansion: bool,
	fail_answer: bool,
	expansion_reply: Option<String>,
}
impl GenerationProvider for SpyGenerator {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		max_tokens: Option<u32>,
	) -> BoxFuture<'a, Result<String>> {
		let user = messages
			.iter()
			.rev()
			.find(|message| message["role"] == "user")
			.and_then(|message| message["content"].as_str())
			.unwrap_or_default()
			.to_string();
		let result = match max_tokens {
			None => {
				let query = between(&user, "Query: \"", "\"\n\nExpanded:").to_string();

				self.log.push(Call::Expand { query: query.clone() });

				if self.fail_expansion {
					Err(Error::unavailable(Collaborator::Generation, "expansion unavailable"))
				} else {
					Ok(self.expansion_reply.clone().unwrap_or_else(|| format!("{query} help needed")))
				}
			},
			Some(_) => {
				let context = between(&user, "CONTEXT:\n", "\n\nQUESTION:\n").to_string();
				let query = between(&user, "QUESTION:\n", "\n\nUsing ONLY").to_string();
				let reply = structured_answer(&query, &context);

				self.log.push(Call::Answer { query, context, max_tokens });

				if self.fail_answer {
					Err(Error::unavailable(Collaborator::Generation, "generation unavailable"))
				} else {
					Ok(reply)
				}
			},
		};

		Box::pin(async move { result })
	}
}

/// Returns constant vectors of a fixed size, which need not match the index.
pub struct FixedEmbedding {
	log: CallLog,
	dim: usize,
}
impl EmbeddingProvider for FixedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		for text in texts {
			self.log.push(Call::Embed { text: text.clone() });
		}

		let vectors = vec![vec![0.0; self.dim]; texts.len()];

		Box::pin(async move { Ok(vectors) })
	}
}

#[derive(Default)]
pub struct HarnessBuilder {
	script: VecDeque<std::result::Result<Vec<Passage>, String>>,
	scores: HashMap<String, f32>,
	failing: HashSet<String>,
	fail_expansion: bool,
	fail_answer: bool,
	expansion_reply: Option<String>,
	embedding_dim: Option<usize>,
}
impl HarnessBuilder {
	/// Queues the passages returned by the next search call.
	pub fn search_results(mut self, passages: Vec<Passage>) -> Self {
		self.script.push_back(Ok(passages));

		self
	}

	pub fn search_error(mut self, message: &str) -> Self {
		self.script.push_back(Err(message.to_string()));

		self
	}

	pub fn score(mut self, content: &str, score: f32) -> Self {
		self.scores.insert(content.to_string(), score);

		self
	}

	pub fn fail_score(mut self, content: &str) -> Self {
		self.failing.insert(content.to_string());

		self
	}

	pub fn fail_expansion(mut self) -> Self {
		self.fail_expansion = true;

		self
	}

	pub fn fail_answer(mut self) -> Self {
		self.fail_answer = true;

		self
	}

	pub fn expansion_reply(mut self, reply: &str) -> Self {
		self.expansion_reply = Some(reply.to_string());

		self
	}

	/// Routes searches through [`EmbeddingIndex`] with embeddings of `dim` values instead of
	/// calling the scripted index directly.
	pub fn embedding_dim(mut self, dim: usize) -> Self {
		self.embedding_dim = Some(dim);

		self
	}

	pub fn build(self) -> Harness {
		let log = CallLog::default();
		let scripted = Arc::new(ScriptedIndex { log: log.clone(), script: Mutex::new(self.script) });
		let embedding = Arc::new(FixedEmbedding {
			log: log.clone(),
			dim: self.embedding_dim.unwrap_or(VECTOR_DIM as usize),
		});
		let cfg = test_config();
		let index: Arc<dyn SearchIndex> = match self.embedding_dim {
			Some(_) => Arc::new(EmbeddingIndex::new(scripted, embedding.clone(), &cfg)),
			None => scripted as Arc<dyn SearchIndex>,
		};
		let providers = helpdesk_service::Providers::new(
			embedding,
			Arc::new(SpyScorer { log: log.clone(), scores: self.scores, failing: self.failing }),
			Arc::new(SpyGenerator {
				log: log.clone(),
				fail_expansion: self.fail_expansion,
				fail_answer: self.fail_answer,
				expansion_reply: self.expansion_reply,
			}),
		);
		let service = HelpdeskService::with_parts(cfg, index, providers)
			.unwrap_or_else(|err| panic!("Failed to build test service: {err}."));

		Harness { service, log }
	}
}

pub struct Harness {
	pub service: HelpdeskService,
	pub log: CallLog,
}
impl Harness {
	pub fn builder() -> HarnessBuilder {
		HarnessBuilder::default()
	}
}

pub fn passages(items: &[(&str, &str)]) -> Vec<Passage> {
	items.iter().map(|(content, source)| Passage::new(*content, *source)).collect()
}

pub fn structured_answer(query: &str, context: &str) -> String {
	if context == NO_CONTEXT_SENTINEL {
		return REFUSAL_ANSWER.to_string();
	}

	let [summary, causes, fix, notes] = SECTION_HEADERS;
	let first_line = context.lines().next().unwrap_or_default();

	format!(
		"{summary}\n{query}\n\n{causes}\n- {first_line}\n\n{fix}\n1. {first_line}\n\n{notes}\n- Based on the knowledge base."
	)
}

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "debug".to_string(),
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:1".to_string(),
				collection: "kb_test".to_string(),
				vector_dim: VECTOR_DIM,
			},
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				dimensions: VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			rerank: ProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				temperature: 0.2,
				max_tokens: 512,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
	}
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
	let Some(from) = text.find(start).map(|at| at + start.len()) else { return "" };
	let rest = &text[from..];

	match rest.find(end) {
		Some(to) => &rest[..to],
		None => rest,
	}
}
