pub mod answer;
pub mod expand;
pub mod generate;
pub mod index;
pub mod rerank;

mod error;

pub use answer::{
	AnswerOutcome, AnswerTrace, AskRequest, AskResponse, CONTEXT_TOP_N, EMPTY_QUERY_ANSWER,
	MAX_RETRIEVAL_RETRIES, MIN_RESULTS, NO_CONTEXT_SENTINEL, SEARCH_K, Stage, assemble_context,
};
pub use error::{Collaborator, Error, Result};
pub use generate::{REFUSAL_ANSWER, SECTION_HEADERS};
pub use index::{EmbeddingIndex, VectorStore, check_query_dim};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use helpdesk_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use helpdesk_domain::{CategoryBooster, Passage};
use helpdesk_providers::{embedding, llm, rerank as rerank_provider};
use helpdesk_storage::qdrant::QdrantStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// Pairwise relevance scoring. Each call stands alone so one failed pair never sinks the others.
pub trait RelevanceScorer
where
	Self: Send + Sync,
{
	fn score<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		passage: &'a str,
	) -> BoxFuture<'a, Result<f32>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		max_tokens: Option<u32>,
	) -> BoxFuture<'a, Result<String>>;
}

/// Nearest-neighbor lookup over stored passages. Implementations embed the text themselves.
pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: &'a str, k: u32) -> BoxFuture<'a, Result<Vec<Passage>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub scorer: Arc<dyn RelevanceScorer>,
	pub generation: Arc<dyn GenerationProvider>,
}

pub struct HelpdeskService {
	pub cfg: Config,
	pub index: Arc<dyn SearchIndex>,
	pub providers: Providers,
	pub booster: CategoryBooster,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			embedding::embed(cfg, texts)
				.await
				.map_err(|err| Error::unavailable(Collaborator::Embedding, err))
		})
	}
}

impl RelevanceScorer for DefaultProviders {
	fn score<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		passage: &'a str,
	) -> BoxFuture<'a, Result<f32>> {
		Box::pin(async move {
			rerank_provider::score(cfg, query, passage)
				.await
				.map_err(|err| Error::unavailable(Collaborator::RelevanceScorer, err))
		})
	}
}

impl GenerationProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
		max_tokens: Option<u32>,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			llm::complete(cfg, messages, max_tokens)
				.await
				.map_err(|err| Error::unavailable(Collaborator::Generation, err))
		})
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		scorer: Arc<dyn RelevanceScorer>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, scorer, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), scorer: provider.clone(), generation: provider }
	}
}

impl HelpdeskService {
	/// Wires the production collaborators around an already verified Qdrant collection.
	pub fn new(cfg: Config, qdrant: QdrantStore) -> Result<Self> {
		let providers = Providers::default();
		let index = EmbeddingIndex::new(Arc::new(qdrant), providers.embedding.clone(), &cfg);

		Self::with_parts(cfg, Arc::new(index), providers)
	}

	pub fn with_parts(
		cfg: Config,
		index: Arc<dyn SearchIndex>,
		providers: Providers,
	) -> Result<Self> {
		let booster = CategoryBooster::new()
			.map_err(|err| Error::InvalidRules { message: err.to_string() })?;

		Ok(Self { cfg, index, providers, booster })
	}
}
