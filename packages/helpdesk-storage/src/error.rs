#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(
		"Vector dimension mismatch for collection {collection}: index has {index}, embedding model has {model}."
	)]
	FormatMismatch { collection: String, index: u64, model: u64 },
	#[error("Collection {0} does not expose a dense vector size.")]
	MissingVectorConfig(String),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
