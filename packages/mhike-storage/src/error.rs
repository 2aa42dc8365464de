#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{0}")]
	InvalidConfig(String),
	#[error("{0}")]
	InvalidResponse(String),
	#[error("{0}")]
	Unavailable(String),
	#[error("{0}")]
	Credentials(String),
	#[error(transparent)]
	Jwt(#[from] jsonwebtoken::errors::Error),
}
