pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Unknown mode {mode:?}.")]
	UnknownMode { mode: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Search unavailable: {message}")]
	SearchUnavailable { message: String },
	#[error("Collection {collection:?} not found.")]
	CollectionNotFound { collection: String },
	#[error("{stage} timed out after {timeout_ms} ms.")]
	Timeout { stage: &'static str, timeout_ms: u64 },
	#[error("Superseded by a newer request.")]
	Superseded,
}
impl From<counsel_config::Error> for Error {
	fn from(err: counsel_config::Error) -> Self {
		Self::Configuration { message: err.to_string() }
	}
}

impl From<counsel_providers::Error> for Error {
	fn from(err: counsel_providers::Error) -> Self {
		Self::EmbeddingUnavailable { message: err.to_string() }
	}
}

impl From<counsel_storage::Error> for Error {
	fn from(err: counsel_storage::Error) -> Self {
		match err {
			counsel_storage::Error::CollectionNotFound { collection } =>
				Self::CollectionNotFound { collection },
			counsel_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			counsel_storage::Error::Unavailable { message } => Self::SearchUnavailable { message },
			counsel_storage::Error::Qdrant(inner) =>
				Self::SearchUnavailable { message: inner.to_string() },
		}
	}
}
