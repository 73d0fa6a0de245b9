//! Wire types for the Gridlink device-cloud session protocol.
//!
//! This crate holds the caller-facing capability bag and the wire contract of
//! the session API: the creation payload, the protocol-variant/route switch,
//! and the creation-response field parsing (including the legacy field-name
//! aliases some deployments still emit). It contains no I/O; transports live
//! in `gridlink-runtime`.

pub mod capabilities;
pub mod session;

pub use capabilities::{Capabilities, CapabilityValue};
pub use session::{
	CAP_PROTOCOL_VERSION, NewSessionRequest, ProtocolVariant, SessionFields,
};
