use std::sync::Arc;

use helpdesk_config::{Config, EmbeddingProviderConfig};
use helpdesk_domain::Passage;
use helpdesk_providers::embedding::clean_input;
use helpdesk_storage::qdrant::QdrantStore;

use crate::{BoxFuture, Collaborator, EmbeddingProvider, Error, Result, SearchIndex};

/// Nearest-neighbor lookup by raw vector.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn vector_dim(&self) -> u32;

	fn nearest<'a>(&'a self, vector: Vec<f32>, k: u32) -> BoxFuture<'a, Result<Vec<Passage>>>;
}

impl VectorStore for QdrantStore {
	fn vector_dim(&self) -> u32 {
		self.vector_dim
	}

	fn nearest<'a>(&'a self, vector: Vec<f32>, k: u32) -> BoxFuture<'a, Result<Vec<Passage>>> {
		Box::pin(async move { Ok(self.search(vector, k).await?) })
	}
}

/// Embeds the query text and looks it up in a vector store.
pub struct EmbeddingIndex {
	store: Arc<dyn VectorStore>,
	embedding: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
}
impl EmbeddingIndex {
	pub fn new(
		store: Arc<dyn VectorStore>,
		embedding: Arc<dyn EmbeddingProvider>,
		cfg: &Config,
	) -> Self {
		Self { store, embedding, cfg: cfg.providers.embedding.clone() }
	}

	async fn embed_query(&self, text: String) -> Result<Vec<f32>> {
		let embeddings = self.embedding.embed(&self.cfg, &[text]).await?;
		let Some(vector) = embeddings.into_iter().next() else {
			return Err(Error::unavailable(
				Collaborator::Embedding,
				"Embedding provider returned no vectors.",
			));
		};

		check_query_dim(&vector, self.store.vector_dim())?;

		Ok(vector)
	}
}

impl SearchIndex for EmbeddingIndex {
	fn search<'a>(&'a self, query: &'a str, k: u32) -> BoxFuture<'a, Result<Vec<Passage>>> {
		Box::pin(async move {
			let text = clean_input(query);

			if text.is_empty() {
				return Ok(Vec::new());
			}

			let vector = self.embed_query(text).await?;

			self.store.nearest(vector, k).await
		})
	}
}

pub fn check_query_dim(vector: &[f32], vector_dim: u32) -> Result<()> {
	if vector.len() != vector_dim as usize {
		return Err(Error::FormatMismatch {
			message: format!(
				"Embedding has {} dimensions but the index expects {vector_dim}.",
				vector.len()
			),
		});
	}

	Ok(())
}
