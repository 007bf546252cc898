pub const DENSE_VECTOR_NAME: &str = "dense";
pub const CONTENT_FIELD: &str = "content";
pub const SOURCE_FIELD: &str = "source";

use std::collections::HashMap;

use qdrant_client::qdrant::{
	CollectionInfo, PointId, Query, QueryPointsBuilder, Value, point_id::PointIdOptions,
	value::Kind, vectors_config::Config as VectorsConfigKind,
};

use crate::{Error, Result};
use helpdesk_domain::Passage;

/// Read-only handle to the passage collection.
///
/// Connecting verifies that the collection's vector size matches the embedding model, so a
/// mismatched index stops the process before it serves any request.
pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	vector_name: Option<String>,
}
impl QdrantStore {
	pub async fn connect(cfg: &helpdesk_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;
		let info = client.collection_info(&cfg.collection).await?.result.ok_or_else(|| {
			Error::MissingVectorConfig(cfg.collection.clone())
		})?;
		let (vector_name, index_dim) = dense_vector_params(&cfg.collection, &info)?;

		check_vector_dim(&cfg.collection, index_dim, cfg.vector_dim)?;

		tracing::info!(
			collection = %cfg.collection,
			vector_dim = cfg.vector_dim,
			vector_name = vector_name.as_deref().unwrap_or("<default>"),
			"Qdrant collection verified."
		);

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			vector_name,
		})
	}

	/// Returns up to `k` passages nearest to `vector`, closest first. Points without a usable
	/// `content` payload are skipped, so the result may be shorter than `k`.
	pub async fn search(&self, vector: Vec<f32>, k: u32) -> Result<Vec<Passage>> {
		let mut query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(k as u64);

		if let Some(name) = self.vector_name.as_ref() {
			query = query.using(name.clone());
		}

		let response = self.client.query(query).await?;
		let mut passages = Vec::with_capacity(response.result.len());

		for point in response.result {
			match passage_from_payload(&point.payload, point.id.as_ref()) {
				Some(passage) => passages.push(passage),
				None => tracing::debug!(id = ?point.id, "Skipping point without passage content."),
			}
		}

		Ok(passages)
	}
}

pub fn check_vector_dim(collection: &str, index_dim: u64, model_dim: u32) -> Result<()> {
	if index_dim != model_dim as u64 {
		return Err(Error::FormatMismatch {
			collection: collection.to_string(),
			index: index_dim,
			model: model_dim as u64,
		});
	}

	Ok(())
}

pub fn passage_from_payload(
	payload: &HashMap<String, Value>,
	id: Option<&PointId>,
) -> Option<Passage> {
	let content = payload_str(payload, CONTENT_FIELD)?;

	if content.trim().is_empty() {
		return None;
	}

	let source = payload_str(payload, SOURCE_FIELD)
		.map(ToString::to_string)
		.or_else(|| id.and_then(point_id_to_string))
		.unwrap_or_default();

	Some(Passage::new(content, source))
}

fn dense_vector_params(collection: &str, info: &CollectionInfo) -> Result<(Option<String>, u64)> {
	let missing = || Error::MissingVectorConfig(collection.to_string());
	let kind = info
		.config
		.as_ref()
		.and_then(|config| config.params.as_ref())
		.and_then(|params| params.vectors_config.as_ref())
		.and_then(|vectors| vectors.config.as_ref())
		.ok_or_else(missing)?;

	match kind {
		VectorsConfigKind::Params(params) => Ok((None, params.size)),
		VectorsConfigKind::ParamsMap(map) => {
			if let Some(params) = map.map.get(DENSE_VECTOR_NAME) {
				return Ok((Some(DENSE_VECTOR_NAME.to_string()), params.size));
			}
			if map.map.len() == 1
				&& let Some((name, params)) = map.map.iter().next()
			{
				return Ok((Some(name.clone()), params.size));
			}

			Err(missing())
		},
	}
}

fn payload_str<'a>(payload: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
	match payload.get(key)?.kind.as_ref()? {
		Kind::StringValue(text) => Some(text.as_str()),
		_ => None,
	}
}

fn point_id_to_string(id: &PointId) -> Option<String> {
	match id.point_id_options.as_ref()? {
		PointIdOptions::Num(num) => Some(num.to_string()),
		PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
	}
}
