//! Session lifecycle supervision: open, keepalive, ordered teardown.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gridlink_protocol::{Capabilities, ProtocolVariant, SessionFields};
use gridlink_runtime::{Endpoint, HttpSessionClient, SessionApi, free_local_port};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use crate::config::SupervisorConfig;
use crate::error::{Error, Result};
use crate::listener::Listener;

/// Lifecycle states of a supervised session.
///
/// `Closed` is terminal; a supervisor is single-use and a new one must be
/// constructed to open another session. A failed `open()` leaves the state at
/// `Opening` rather than silently transitioning to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Created,
	Opening,
	Active,
	Closing,
	Closed,
}

impl std::fmt::Display for SessionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			SessionState::Created => "created",
			SessionState::Opening => "opening",
			SessionState::Active => "active",
			SessionState::Closing => "closing",
			SessionState::Closed => "closed",
		};
		write!(f, "{name}")
	}
}

/// How a teardown sequence reports step failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Report {
	/// Caller-facing close: log failures at warn, keep going.
	Surface,
	/// Escalation path: record at debug only; nobody is listening for these.
	Suppress,
}

/// State shared between the caller and the heartbeat task.
///
/// Everything the close/tick race touches lives behind this one mutex. The
/// lock is never held across an await.
struct Shared {
	state: SessionState,
	fields: SessionFields,
	raw_response: Option<String>,
	local_port: Option<u16>,
	listener: Option<Box<dyn Listener>>,
	listener_started: bool,
	failures: u32,
	heartbeat: Option<JoinHandle<()>>,
}

struct Inner {
	config: SupervisorConfig,
	capabilities: Capabilities,
	variant: ProtocolVariant,
	target_base: String,
	api: Arc<dyn SessionApi>,
	shared: Mutex<Shared>,
	/// One-shot latch: at most one full teardown sequence ever executes.
	torn_down: AtomicBool,
	/// Cancels future heartbeat ticks without joining the task.
	heartbeat_cancel: watch::Sender<bool>,
}

/// Supervises one remote device-testing session.
///
/// Owns the session state machine, the heartbeat scheduler, the local
/// listener's lifecycle, and the teardown protocol. Cloneable handles are not
/// provided; the supervisor itself is cheap to share behind an `Arc` if the
/// embedder needs to close from another task.
pub struct Supervisor {
	inner: Arc<Inner>,
}

impl Supervisor {
	/// Creates a supervisor speaking HTTP to `config.base_url`.
	///
	/// The protocol variant is resolved here, once, from the capability bag;
	/// V1 sessions need `listener`, V2 sessions never start one.
	pub fn new(
		config: SupervisorConfig,
		capabilities: Capabilities,
		listener: Option<Box<dyn Listener>>,
	) -> Result<Self> {
		let variant = ProtocolVariant::from_capabilities(&capabilities);
		let endpoint = Endpoint::new(&config.base_url, variant);
		let api = HttpSessionClient::new(endpoint, config.request_timeout)?;
		Ok(Self::with_api(config, capabilities, Arc::new(api), listener))
	}

	/// Creates a supervisor over an injected session API.
	///
	/// This is the seam tests and alternative transports use; `new` is a thin
	/// wrapper around it.
	pub fn with_api(
		config: SupervisorConfig,
		capabilities: Capabilities,
		api: Arc<dyn SessionApi>,
		listener: Option<Box<dyn Listener>>,
	) -> Self {
		let variant = ProtocolVariant::from_capabilities(&capabilities);
		let target_base = Endpoint::new(&config.base_url, variant).target_base();
		let (heartbeat_cancel, _) = watch::channel(false);

		Self {
			inner: Arc::new(Inner {
				config,
				capabilities,
				variant,
				target_base,
				api,
				shared: Mutex::new(Shared {
					state: SessionState::Created,
					fields: SessionFields::default(),
					raw_response: None,
					local_port: None,
					listener,
					listener_started: false,
					failures: 0,
					heartbeat: None,
				}),
				torn_down: AtomicBool::new(false),
				heartbeat_cancel,
			}),
		}
	}

	/// Opens the remote session.
	///
	/// Creates the session, starts the local listener (V1 only), and starts
	/// the heartbeat scheduler - in that order, so no heartbeat can race a
	/// not-yet-created session and no scheduler runs if the listener fails.
	///
	/// # Errors
	///
	/// [`Error::RemoteSession`] when the service rejects creation,
	/// [`Error::ListenerStart`] when the listener cannot bind, and
	/// [`Error::AlreadyOpened`] on a second call. All are fatal for this
	/// supervisor.
	pub async fn open(&self) -> Result<()> {
		let inner = &self.inner;
		{
			let mut shared = inner.shared.lock();
			if shared.state != SessionState::Created {
				return Err(Error::AlreadyOpened);
			}
			shared.state = SessionState::Opening;
		}

		info!(
			target = "gridlink.session",
			variant = %inner.variant,
			target_base = %inner.target_base,
			"opening remote session"
		);

		let raw = match inner.api.create(&inner.capabilities).await {
			Ok(raw) => raw,
			Err(gridlink_runtime::Error::Remote { body }) => {
				return Err(Error::RemoteSession(body));
			}
			Err(err) => return Err(err.into()),
		};

		// The raw body is kept verbatim even when parsing comes up empty;
		// partial responses are a diagnostic, not a reason to drop data.
		let fields = SessionFields::parse(&raw);
		if fields.session_id.is_none() {
			warn!(target = "gridlink.session", "creation response carried no recognizable session id");
		}
		{
			let mut shared = inner.shared.lock();
			shared.fields = fields.clone();
			shared.raw_response = Some(raw);
		}

		let session_id = fields.session_id.unwrap_or_default();

		if inner.variant == ProtocolVariant::V1 {
			self.start_listener(&session_id).await?;
		}

		// Always last: once the scheduler runs, the session counts as live.
		self.spawn_heartbeat(session_id.clone());

		{
			let mut shared = inner.shared.lock();
			shared.state = SessionState::Active;
		}
		info!(target = "gridlink.session", session_id = %session_id, "session active");
		Ok(())
	}

	/// Discovers an ephemeral port and starts the listener on it.
	async fn start_listener(&self, session_id: &str) -> Result<()> {
		let inner = &self.inner;

		let Some(mut listener) = inner.shared.lock().listener.take() else {
			return Err(Error::ListenerStart {
				source: io::Error::new(
					io::ErrorKind::Unsupported,
					"v1 session requires a local listener but none was configured",
				),
			});
		};

		let port = free_local_port().map_err(|source| Error::ListenerStart { source })?;
		info!(target = "gridlink.session", port, session_id, "starting local listener");

		match listener.start(port, &inner.target_base, session_id).await {
			Ok(()) => {
				let mut shared = inner.shared.lock();
				shared.listener = Some(listener);
				shared.listener_started = true;
				shared.local_port = Some(port);
				Ok(())
			}
			// The listener never started, so there is nothing to stop; open()
			// fails before the scheduler exists.
			Err(source) => Err(Error::ListenerStart { source }),
		}
	}

	/// Spawns the keepalive scheduler: fixed-rate, single worker, ticks
	/// strictly serialized. An overrunning tick delays the next one instead
	/// of overlapping it.
	fn spawn_heartbeat(&self, session_id: String) {
		let inner = Arc::clone(&self.inner);
		let mut cancel = inner.heartbeat_cancel.subscribe();
		info!(target = "gridlink.heartbeat", session_id = %session_id, "starting keepalive");

		let handle = tokio::spawn(async move {
			let period = inner.config.heartbeat_interval;
			let mut ticks = time::interval_at(Instant::now() + period, period);
			ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					biased;
					_ = cancel.changed() => break,
					_ = ticks.tick() => {
						if !heartbeat_tick(&inner, &session_id).await {
							break;
						}
					}
				}
			}
			debug!(target = "gridlink.heartbeat", session_id = %session_id, "keepalive stopped");
		});

		self.inner.shared.lock().heartbeat = Some(handle);
	}

	/// Tears the session down, reporting step failures at warn level.
	///
	/// Idempotent: only the first of any `close`/`close_silently` invocation
	/// performs work. Never returns an error - teardown failures are
	/// diagnostic only.
	pub async fn close(&self) {
		teardown(&self.inner, Report::Surface, true).await;
	}

	/// Tears the session down, suppressing step failures.
	///
	/// Used internally by heartbeat escalation, where surfacing an error
	/// would propagate out of a background task nobody is watching; exposed
	/// for embedders that want the same behavior.
	pub async fn close_silently(&self) {
		teardown(&self.inner, Report::Suppress, false).await;
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		self.inner.shared.lock().state
	}

	/// Protocol variant resolved at construction.
	pub fn variant(&self) -> ProtocolVariant {
		self.inner.variant
	}

	/// Service address (base plus route) the session runs against.
	pub fn target_base(&self) -> &str {
		&self.inner.target_base
	}

	/// Session identifier. Set after a successful `open()`.
	pub fn session_id(&self) -> Option<String> {
		self.inner.shared.lock().fields.session_id.clone()
	}

	/// Local listener port. Set only for V1 sessions with a started listener.
	pub fn local_port(&self) -> Option<u16> {
		self.inner.shared.lock().local_port
	}

	/// Live-view URL reported by the service, when present.
	pub fn live_view_url(&self) -> Option<String> {
		self.inner.shared.lock().fields.live_view_url.clone()
	}

	/// Test-report URL reported by the service, when present.
	pub fn test_report_url(&self) -> Option<String> {
		self.inner.shared.lock().fields.test_report_url.clone()
	}

	/// Raw session-creation response body, verbatim.
	pub fn raw_session_response(&self) -> Option<String> {
		self.inner.shared.lock().raw_response.clone()
	}
}

/// One keepalive attempt. Returns `false` when the scheduler must stop.
async fn heartbeat_tick(inner: &Arc<Inner>, session_id: &str) -> bool {
	match inner.api.heartbeat(session_id).await {
		Ok(_) => {
			inner.shared.lock().failures = 0;
			trace!(target = "gridlink.heartbeat", session_id, "keepalive ok");
			true
		}
		Err(err) => {
			let failures = {
				let mut shared = inner.shared.lock();
				shared.failures += 1;
				shared.failures
			};
			warn!(
				target = "gridlink.heartbeat",
				session_id,
				failures,
				error = %err,
				"keepalive failed; retrying on next tick"
			);

			if failures > inner.config.max_heartbeat_failures {
				error!(
					target = "gridlink.heartbeat",
					session_id, "keepalive retries exhausted; tearing session down"
				);
				teardown(inner, Report::Suppress, false).await;
				false
			} else {
				true
			}
		}
	}
}

/// Ordered best-effort teardown. Each step runs regardless of earlier
/// failures; `join_scheduler` must be false on the escalation path, which
/// executes inside the scheduler task and cannot wait for its own tick.
async fn teardown(inner: &Arc<Inner>, report: Report, join_scheduler: bool) {
	if inner.torn_down.swap(true, Ordering::SeqCst) {
		return;
	}

	{
		let mut shared = inner.shared.lock();
		shared.state = SessionState::Closing;
	}
	info!(target = "gridlink.session", "closing session");

	// 1. Stop the scheduler: cancel future ticks, give an in-flight tick a
	// bounded chance to wind down, never force-abort it.
	let _ = inner.heartbeat_cancel.send(true);
	let handle = inner.shared.lock().heartbeat.take();
	if let Some(handle) = handle {
		if join_scheduler {
			match time::timeout(Duration::from_secs(1), handle).await {
				Ok(Ok(())) => {}
				Ok(Err(err)) => report_step(report, "stop scheduler", &err),
				Err(_) => {
					debug!(target = "gridlink.session", "keepalive task still winding down; not waiting")
				}
			}
		}
	}

	// 2. Delete the remote session; a no-op when no id was ever assigned.
	let session_id = inner.shared.lock().fields.session_id.clone();
	match session_id.filter(|id| !id.trim().is_empty()) {
		Some(id) => {
			if let Err(err) = inner.api.delete(&id).await {
				report_step(report, "delete session", &err);
			}
		}
		None => debug!(target = "gridlink.session", "no session id assigned; skipping delete"),
	}

	// 3. Stop the listener iff it was started. Taking it out of shared state
	// makes a second stop impossible.
	let listener = {
		let mut shared = inner.shared.lock();
		if shared.listener_started { shared.listener.take() } else { None }
	};
	if let Some(mut listener) = listener {
		listener.stop().await;
		debug!(target = "gridlink.session", "local listener stopped");
	}

	// 4. Release the transport.
	if let Err(err) = inner.api.close().await {
		report_step(report, "release transport", &err);
	}

	{
		let mut shared = inner.shared.lock();
		shared.state = SessionState::Closed;
	}
	info!(target = "gridlink.session", "session closed");
}

fn report_step(report: Report, step: &str, err: &dyn std::fmt::Display) {
	match report {
		Report::Surface => {
			warn!(target = "gridlink.session", step, error = %err, "teardown step failed; continuing")
		}
		Report::Suppress => {
			debug!(target = "gridlink.session", step, error = %err, "teardown step failed; continuing")
		}
	}
}
