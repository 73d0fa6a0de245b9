//! Error types for the Gridlink transport.

use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the session service.
#[derive(Debug, Error)]
pub enum Error {
	/// The service answered with an explicit error status.
	///
	/// Carries the response body verbatim; device-cloud error bodies are the
	/// only diagnostic the service provides.
	#[error("remote session error: {body}")]
	Remote {
		/// Raw response body, unparsed.
		body: String,
	},

	/// Connection, TLS, or timeout failure before a usable response arrived.
	#[error("transport error: {0}")]
	Transport(String),
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::Transport(err.to_string())
	}
}

impl Error {
	/// Returns the raw response body if this is a service error.
	pub fn remote_body(&self) -> Option<&str> {
		match self {
			Error::Remote { body } => Some(body),
			_ => None,
		}
	}
}
