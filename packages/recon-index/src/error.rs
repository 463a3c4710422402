pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Transport(#[from] reqwest::Error),
	#[error("Index returned HTTP {status}: {body}")]
	Status { status: u16, body: String },
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Connection failures, timeouts and non-success HTTP statuses.
	pub fn is_transport(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Status { .. })
	}
}
