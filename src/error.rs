//! Crate-wide error types and `Result` alias.

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the mock provider.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Jsonwebtoken(#[from] jsonwebtoken::errors::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),

	#[error("Invalid duration format: {input:?}.")]
	InvalidDurationFormat { input: String },
	#[error("Key generation failed: {0}")]
	KeyGeneration(String),
	#[error("Persisted key sets are inconsistent: {0}")]
	KeySetMismatch(String),
	#[error("Failed to parse key set '{name}': {source}")]
	KeySetParse { name: String, source: serde_json::Error },
	#[error("Metrics error: {0}")]
	Metrics(String),
	#[error("Issuer is required.")]
	MissingIssuer,
	#[error("Signing failed: {0}")]
	Signing(String),
	#[error("Failed to read key set '{name}': {source}")]
	StorageRead { name: String, source: std::io::Error },
	#[error("Failed to write key set '{name}': {source}")]
	StorageWrite { name: String, source: std::io::Error },
	#[error("Validation failed for {field}: {reason}")]
	Validation { field: &'static str, reason: String },
}
