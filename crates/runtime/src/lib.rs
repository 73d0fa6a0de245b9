//! Gridlink runtime - remote transport for device-cloud sessions
//!
//! This crate provides the low-level plumbing the supervisor builds on:
//!
//! - **Endpoint resolution**: base address + protocol-variant route
//! - **Session API**: the three remote operations (create, heartbeat, delete)
//!   behind the [`SessionApi`] trait, with an HTTP implementation
//! - **Port discovery**: finding a free ephemeral port for the local listener
//!
//! # Decoupling via SessionApi
//!
//! The supervisor in `gridlink-rs` talks to the service exclusively through
//! [`SessionApi`], so tests can script the remote side without a network and
//! alternative transports can be slotted in without touching lifecycle code.

pub mod api;
pub mod error;
pub mod http;
pub mod port;

pub use api::SessionApi;
pub use error::{Error, Result};
pub use http::{Endpoint, HttpSessionClient};
pub use port::free_local_port;
