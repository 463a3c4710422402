pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read model file at {path:?}.")]
	ReadModel { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse model document.")]
	ParseModel(#[source] serde_json::Error),
	#[error("Invalid model: {message}")]
	InvalidModel { message: String },
	#[error("Unknown schema: {0}")]
	UnknownSchema(String),
	#[error("Unknown property {property} on schema {schema}.")]
	UnknownProperty { schema: String, property: String },
	#[error("Invalid entity: {message}")]
	InvalidEntity { message: String },
	#[error("Invalid datasets: {message}")]
	InvalidDatasets { message: String },
}
