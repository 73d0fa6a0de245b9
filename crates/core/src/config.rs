//! Supervisor configuration.
//!
//! The source of truth for the base address is explicit configuration passed
//! in by the embedder; there are no global endpoint constants.

use std::time::Duration;

/// Timeout applied to every remote request.
///
/// Minutes-scale on purpose: allocating a physical device can take that long,
/// and the creation call blocks for the whole provisioning window.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Delay before the first heartbeat and interval between heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Consecutive heartbeat failures tolerated before the session is torn down.
///
/// Failures retry on the next scheduled tick, never immediately, so the
/// tolerance window spans roughly `(threshold + 1) * interval` of wall time.
pub const DEFAULT_MAX_HEARTBEAT_FAILURES: u32 = 6;

/// Configuration for a [`Supervisor`](crate::Supervisor).
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
	/// Base address of the device-cloud API, e.g. `https://cloud.example.com/api`.
	pub base_url: String,
	/// Timeout applied to every remote request.
	pub request_timeout: Duration,
	/// Delay before the first heartbeat and interval between heartbeats.
	pub heartbeat_interval: Duration,
	/// Consecutive heartbeat failures tolerated before silent teardown.
	pub max_heartbeat_failures: u32,
}

impl SupervisorConfig {
	/// Creates a configuration with default timing for `base_url`.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
			max_heartbeat_failures: DEFAULT_MAX_HEARTBEAT_FAILURES,
		}
	}

	/// Sets the remote request timeout.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Sets the heartbeat delay/interval.
	pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
		self.heartbeat_interval = interval;
		self
	}

	/// Sets the consecutive-failure threshold for heartbeat escalation.
	pub fn with_max_heartbeat_failures(mut self, max: u32) -> Self {
		self.max_heartbeat_failures = max;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_service_expectations() {
		let config = SupervisorConfig::new("https://cloud.example.com/api");
		assert_eq!(config.request_timeout, Duration::from_secs(600));
		assert_eq!(config.heartbeat_interval, Duration::from_secs(10));
		assert_eq!(config.max_heartbeat_failures, 6);
	}

	#[test]
	fn builders_override_defaults() {
		let config = SupervisorConfig::new("https://cloud.example.com/api")
			.with_request_timeout(Duration::from_secs(30))
			.with_heartbeat_interval(Duration::from_secs(1))
			.with_max_heartbeat_failures(2);
		assert_eq!(config.request_timeout, Duration::from_secs(30));
		assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
		assert_eq!(config.max_heartbeat_failures, 2);
	}
}
