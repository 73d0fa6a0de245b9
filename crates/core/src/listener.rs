//! Contract for the local endpoint that bridges an automation client to the
//! remote session.
//!
//! Gridlink does not define the forwarding or rewriting logic; the embedding
//! application supplies an implementation and the supervisor only drives its
//! lifecycle: started once during `open()` for V1 sessions, stopped exactly
//! once during teardown.

use std::io;

use async_trait::async_trait;

/// A locally bound endpoint relaying automation-protocol traffic to the
/// remote session.
#[async_trait]
pub trait Listener: Send {
	/// Binds `port` and begins relaying traffic to `target`, scoped to
	/// `session_id`.
	///
	/// `target` is the service base address including the session route. On
	/// error no relaying occurs and the supervisor treats the session open as
	/// failed.
	async fn start(&mut self, port: u16, target: &str, session_id: &str) -> io::Result<()>;

	/// Releases the local endpoint and any relaying resources.
	///
	/// Must be safe to invoke when never started and safe to invoke
	/// repeatedly; must not fail.
	async fn stop(&mut self);
}
