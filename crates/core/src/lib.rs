//! Gridlink - session lifecycle supervisor for remote device testing
//!
//! Gridlink opens a capability-negotiated session against a cloud
//! device-testing service, keeps it alive with a fixed-interval heartbeat,
//! supervises the local listener that bridges a standard automation client to
//! the remote session, and guarantees idempotent, ordered, best-effort
//! teardown - including the abnormal teardown triggered when heartbeat
//! retries are exhausted.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    Supervisor    │  state machine, heartbeat scheduler, teardown
//! └───────┬──────────┘
//!         │ SessionApi            │ Listener
//! ┌───────▼──────────┐   ┌────────▼─────────┐
//! │ gridlink-runtime │   │ caller-supplied  │
//! │ (HTTP transport) │   │ local forwarder  │
//! └──────────────────┘   └──────────────────┘
//! ```
//!
//! The supervisor never touches the network directly: remote calls go through
//! [`SessionApi`] and local relaying through [`Listener`], so both sides can
//! be substituted in tests or by embedders.
//!
//! # Example
//!
//! ```no_run
//! use gridlink::{Capabilities, Supervisor, SupervisorConfig};
//!
//! # async fn run(listener: Box<dyn gridlink::Listener>) -> gridlink::Result<()> {
//! let mut caps = Capabilities::new();
//! caps.set("deviceName", "Pixel 8");
//!
//! let config = SupervisorConfig::new("https://cloud.example.com/api");
//! let supervisor = Supervisor::new(config, caps, Some(listener))?;
//! supervisor.open().await?;
//! // ... drive the automation client against supervisor.local_port() ...
//! supervisor.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod listener;
pub mod supervisor;

pub use config::{
	DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_MAX_HEARTBEAT_FAILURES, DEFAULT_REQUEST_TIMEOUT,
	SupervisorConfig,
};
pub use error::{Error, Result};
pub use listener::Listener;
pub use supervisor::{SessionState, Supervisor};

// Re-export the wire-level types callers interact with directly.
pub use gridlink_protocol::{CAP_PROTOCOL_VERSION, Capabilities, CapabilityValue, ProtocolVariant};
pub use gridlink_runtime::SessionApi;
