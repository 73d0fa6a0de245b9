//! Error types surfaced by the supervisor.
//!
//! Only fatal-at-open conditions reach the caller as values. Heartbeat
//! failures feed the escalation counter, and teardown step failures are
//! reported through tracing; neither ever becomes a returned error.

use thiserror::Error;

/// Result type alias for supervisor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening a session.
#[derive(Debug, Error)]
pub enum Error {
	/// The service rejected session creation with an explicit error.
	///
	/// Carries the response body verbatim. This is fatal: the supervisor
	/// stays in `Opening` and must not be reused; construct a new one to
	/// retry.
	#[error("remote session error: {0}")]
	RemoteSession(String),

	/// The local forwarding listener failed to bind or start.
	///
	/// Fatal during `open()`; the heartbeat scheduler is never started and
	/// no listener is left running.
	#[error("listener start failed: {source}")]
	ListenerStart {
		#[source]
		source: std::io::Error,
	},

	/// `open()` was called on a supervisor that already opened a session.
	#[error("session already opened; construct a new supervisor to retry")]
	AlreadyOpened,

	/// Transport failure before the service produced a response.
	#[error(transparent)]
	Transport(#[from] gridlink_runtime::Error),
}
