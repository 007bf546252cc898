use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
	Embedding,
	SearchIndex,
	RelevanceScorer,
	Generation,
}
impl fmt::Display for Collaborator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Embedding => "embedding provider",
			Self::SearchIndex => "search index",
			Self::RelevanceScorer => "relevance scorer",
			Self::Generation => "generation provider",
		})
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("The {collaborator} is unavailable: {message}")]
	CollaboratorUnavailable { collaborator: Collaborator, message: String },
	#[error("Format mismatch: {message}")]
	FormatMismatch { message: String },
	#[error("Invalid category rules: {message}")]
	InvalidRules { message: String },
}
impl Error {
	pub fn unavailable(collaborator: Collaborator, err: impl fmt::Display) -> Self {
		Self::CollaboratorUnavailable { collaborator, message: err.to_string() }
	}
}

impl From<helpdesk_storage::Error> for Error {
	fn from(err: helpdesk_storage::Error) -> Self {
		match err {
			helpdesk_storage::Error::FormatMismatch { .. } => {
				Self::FormatMismatch { message: err.to_string() }
			},
			other => Self::unavailable(Collaborator::SearchIndex, other),
		}
	}
}
