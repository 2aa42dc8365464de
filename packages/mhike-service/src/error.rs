pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Embedding generation failed: {message}")]
	Embedding { message: String },
	#[error("Candidate fetch failed: {message}")]
	CandidateFetch { message: String },
	#[error("Embedding dimension mismatch for {id}: query has {expected}, candidate has {actual}.")]
	DimensionMismatch { id: String, expected: usize, actual: usize },
}
impl From<mhike_providers::Error> for Error {
	fn from(err: mhike_providers::Error) -> Self {
		Self::Embedding { message: err.to_string() }
	}
}

impl From<mhike_storage::Error> for Error {
	fn from(err: mhike_storage::Error) -> Self {
		Self::CandidateFetch { message: err.to_string() }
	}
}
