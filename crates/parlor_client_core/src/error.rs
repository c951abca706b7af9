use parlor_domain::InputError;
use thiserror::Error;

/// Failure to complete a request at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
	#[error("{path}: request failed: {message}")]
	Request { path: String, message: String },

	#[error("{path}: request timed out")]
	Timeout { path: String },

	#[error("{path}: unreadable response body: {message}")]
	Body { path: String, message: String },
}

impl TransportError {
	/// Endpoint path the failing request targeted.
	pub fn path(&self) -> &str {
		match self {
			Self::Request { path, .. } | Self::Timeout { path } | Self::Body { path, .. } => path,
		}
	}
}

/// Errors for client core operations.
#[derive(Debug, Error)]
pub enum ClientCoreError {
	#[error(transparent)]
	Transport(#[from] TransportError),

	#[error(transparent)]
	InvalidInput(#[from] InputError),

	#[error("not signed in")]
	NotSignedIn,

	#[error("not in a channel")]
	NotInChannel,

	#[error("client task is not running")]
	Stopped,

	#[error("error: {0}")]
	Other(String),
}

impl From<anyhow::Error> for ClientCoreError {
	fn from(e: anyhow::Error) -> Self {
		ClientCoreError::Other(format!("{e:#}"))
	}
}
