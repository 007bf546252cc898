use serde::{Deserialize, Serialize};

/// A stored knowledge-base passage. The pipeline reorders passages but never edits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
	pub content: String,
	pub source: String,
}
impl Passage {
	pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
		Self { content: content.into(), source: source.into() }
	}
}
