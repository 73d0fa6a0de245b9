//! Remote session contract consumed by the lifecycle supervisor.

use async_trait::async_trait;
use gridlink_protocol::Capabilities;

use crate::error::Result;

/// The three remote operations a session's lifetime is built from.
///
/// Each call is a single request/response exchange with the configured
/// request timeout; none of them can be cancelled mid-flight. Implementations
/// must be shareable across the caller task and the heartbeat task.
#[async_trait]
pub trait SessionApi: Send + Sync {
	/// Creates a remote session from a capability bag.
	///
	/// Returns the raw response body on success so the caller can keep it
	/// verbatim even when field parsing comes up short.
	async fn create(&self, capabilities: &Capabilities) -> Result<String>;

	/// Sends one keepalive for `session_id`.
	///
	/// Any failure (transport, timeout, non-success status) is an error; the
	/// supervisor counts consecutive failures, it does not distinguish them.
	async fn heartbeat(&self, session_id: &str) -> Result<String>;

	/// Deletes the remote session.
	async fn delete(&self, session_id: &str) -> Result<()>;

	/// Releases the underlying transport. Safe to call more than once.
	async fn close(&self) -> Result<()>;
}
