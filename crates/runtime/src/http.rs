//! HTTP implementation of the session API.

use std::time::Duration;

use async_trait::async_trait;
use gridlink_protocol::{Capabilities, NewSessionRequest, ProtocolVariant};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::api::SessionApi;
use crate::error::{Error, Result};

/// Resolved service endpoint: base address plus the variant route.
///
/// All session URLs derive from `{base}/{route}`; the route is fixed at
/// construction from the protocol variant and never re-resolved.
#[derive(Debug, Clone)]
pub struct Endpoint {
	base: String,
	variant: ProtocolVariant,
}

impl Endpoint {
	/// Creates an endpoint from a base address and a resolved variant.
	///
	/// Trailing slashes on the base are normalized away so URL joins stay
	/// predictable.
	pub fn new(base_url: &str, variant: ProtocolVariant) -> Self {
		Self {
			base: base_url.trim_end_matches('/').to_string(),
			variant,
		}
	}

	/// Protocol variant this endpoint routes to.
	pub fn variant(&self) -> ProtocolVariant {
		self.variant
	}

	/// `{base}/{route}` - the address the local listener forwards to.
	pub fn target_base(&self) -> String {
		format!("{}/{}", self.base, self.variant.route())
	}

	/// URL for session creation.
	pub fn session_url(&self) -> String {
		format!("{}/session", self.target_base())
	}

	/// URL for one session instance.
	pub fn session_instance_url(&self, session_id: &str) -> String {
		format!("{}/session/{}", self.target_base(), session_id)
	}

	/// URL for a session's keepalive.
	pub fn keepalive_url(&self, session_id: &str) -> String {
		format!("{}/session/{}/keepalive", self.target_base(), session_id)
	}
}

/// [`SessionApi`] over HTTP via reqwest.
///
/// One request timeout applies to every call; it is minutes-scale by default
/// because device provisioning can legitimately take that long.
#[derive(Debug)]
pub struct HttpSessionClient {
	http: reqwest::Client,
	endpoint: Endpoint,
}

impl HttpSessionClient {
	/// Builds a client for `endpoint` with the given request timeout.
	pub fn new(endpoint: Endpoint, request_timeout: Duration) -> Result<Self> {
		let http = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(|err| Error::Transport(err.to_string()))?;

		Ok(Self { http, endpoint })
	}

	/// Endpoint this client talks to.
	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}
}

#[async_trait]
impl SessionApi for HttpSessionClient {
	async fn create(&self, capabilities: &Capabilities) -> Result<String> {
		let url = self.endpoint.session_url();
		debug!(target = "gridlink.http", %url, "creating session");

		let response = self
			.http
			.post(&url)
			.json(&NewSessionRequest::new(capabilities))
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;
		if !status.is_success() {
			return Err(Error::Remote { body });
		}

		trace!(target = "gridlink.http", %status, "session created");
		Ok(body)
	}

	async fn heartbeat(&self, session_id: &str) -> Result<String> {
		let url = self.endpoint.keepalive_url(session_id);

		// The keepalive body is intentionally empty; only the POST matters.
		let response = self
			.http
			.post(&url)
			.header(CONTENT_TYPE, "application/json")
			.body("")
			.send()
			.await?;

		let status = response.status();
		let body = response.text().await?;
		if !status.is_success() {
			return Err(Error::Remote { body });
		}

		trace!(target = "gridlink.http", session_id, "keepalive acknowledged");
		Ok(body)
	}

	async fn delete(&self, session_id: &str) -> Result<()> {
		let url = self.endpoint.session_instance_url(session_id);
		debug!(target = "gridlink.http", session_id, "deleting session");

		let response = self.http.delete(&url).send().await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await?;
			return Err(Error::Remote { body });
		}

		Ok(())
	}

	async fn close(&self) -> Result<()> {
		// reqwest pools are released on drop; nothing to flush.
		debug!(target = "gridlink.http", "transport released");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpListener;
	use tokio::task::JoinHandle;

	use super::*;

	#[test]
	fn endpoint_urls_for_v1() {
		let endpoint = Endpoint::new("https://cloud.example.com/api", ProtocolVariant::V1);
		assert_eq!(endpoint.target_base(), "https://cloud.example.com/api/proxy");
		assert_eq!(endpoint.session_url(), "https://cloud.example.com/api/proxy/session");
		assert_eq!(
			endpoint.keepalive_url("abc"),
			"https://cloud.example.com/api/proxy/session/abc/keepalive"
		);
		assert_eq!(
			endpoint.session_instance_url("abc"),
			"https://cloud.example.com/api/proxy/session/abc"
		);
	}

	#[test]
	fn endpoint_urls_for_v2() {
		let endpoint = Endpoint::new("https://cloud.example.com/api", ProtocolVariant::V2);
		assert_eq!(endpoint.session_url(), "https://cloud.example.com/api/v2/session");
	}

	#[test]
	fn endpoint_normalizes_trailing_slash() {
		let endpoint = Endpoint::new("https://cloud.example.com/api/", ProtocolVariant::V1);
		assert_eq!(endpoint.session_url(), "https://cloud.example.com/api/proxy/session");
	}

	/// Serves exactly one canned HTTP/1.1 response on an ephemeral port.
	async fn stub_once(status_line: &'static str, body: &'static str) -> (u16, JoinHandle<()>) {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let port = listener.local_addr().unwrap().port();

		let handle = tokio::spawn(async move {
			let (mut stream, _) = listener.accept().await.unwrap();

			// Drain the full request (headers plus content-length body) before
			// answering, so the client never sees a reset mid-write.
			let mut request = Vec::new();
			let mut buf = [0u8; 1024];
			loop {
				let n = stream.read(&mut buf).await.unwrap();
				if n == 0 {
					break;
				}
				request.extend_from_slice(&buf[..n]);
				if let Some(end) = headers_end(&request) {
					let content_length = content_length(&request[..end]);
					if request.len() >= end + content_length {
						break;
					}
				}
			}

			let response = format!(
				"HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
				body.len()
			);
			stream.write_all(response.as_bytes()).await.unwrap();
			let _ = stream.shutdown().await;
		});

		(port, handle)
	}

	fn headers_end(data: &[u8]) -> Option<usize> {
		data.windows(4).position(|w| w == b"\r\n\r\n".as_slice()).map(|pos| pos + 4)
	}

	fn content_length(headers: &[u8]) -> usize {
		String::from_utf8_lossy(headers)
			.lines()
			.find_map(|line| {
				let (name, value) = line.split_once(':')?;
				name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
			})
			.unwrap_or(0)
	}

	fn client_for(port: u16) -> HttpSessionClient {
		let endpoint = Endpoint::new(&format!("http://127.0.0.1:{port}/api"), ProtocolVariant::V1);
		HttpSessionClient::new(endpoint, Duration::from_secs(5)).unwrap()
	}

	#[tokio::test]
	async fn create_returns_raw_body() {
		let (port, server) = stub_once("200 OK", r#"{"sessionId":"abc123"}"#).await;
		let client = client_for(port);

		let raw = client.create(&Capabilities::new()).await.unwrap();
		assert_eq!(raw, r#"{"sessionId":"abc123"}"#);
		server.await.unwrap();
	}

	#[tokio::test]
	async fn create_surfaces_server_error_body() {
		let (port, server) = stub_once("500 Internal Server Error", "no devices available").await;
		let client = client_for(port);

		let err = client.create(&Capabilities::new()).await.unwrap_err();
		assert_eq!(err.remote_body(), Some("no devices available"));
		server.await.unwrap();
	}

	#[tokio::test]
	async fn heartbeat_non_success_is_an_error() {
		let (port, server) = stub_once("404 Not Found", "unknown session").await;
		let client = client_for(port);

		let err = client.heartbeat("abc123").await.unwrap_err();
		assert_eq!(err.remote_body(), Some("unknown session"));
		server.await.unwrap();
	}

	#[tokio::test]
	async fn delete_succeeds_on_success_status() {
		let (port, server) = stub_once("200 OK", "").await;
		let client = client_for(port);

		client.delete("abc123").await.unwrap();
		server.await.unwrap();
	}

	#[tokio::test]
	async fn connection_refused_is_a_transport_error() {
		let port = crate::port::free_local_port().unwrap();
		let client = client_for(port);

		let err = client.heartbeat("abc123").await.unwrap_err();
		assert!(matches!(err, Error::Transport(_)));
	}
}
