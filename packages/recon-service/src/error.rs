pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Index error: {message}")]
	Index { message: String },
	#[error("Model error: {message}")]
	Model { message: String },
}
impl From<recon_index::Error> for Error {
	fn from(err: recon_index::Error) -> Self {
		Self::Index { message: err.to_string() }
	}
}

impl From<recon_model::Error> for Error {
	fn from(err: recon_model::Error) -> Self {
		match err {
			recon_model::Error::UnknownSchema(_)
			| recon_model::Error::UnknownProperty { .. }
			| recon_model::Error::InvalidEntity { .. } => {
				Self::InvalidRequest { message: err.to_string() }
			},
			other => Self::Model { message: other.to_string() },
		}
	}
}
