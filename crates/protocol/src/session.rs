//! Session-creation payload, protocol-variant routing, and response parsing.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::capabilities::{Capabilities, CapabilityValue};

/// Capability that selects the protocol variant for a session.
///
/// An integer value of `2` selects [`ProtocolVariant::V2`]; any other value,
/// type, or absence selects [`ProtocolVariant::V1`].
pub const CAP_PROTOCOL_VERSION: &str = "protocolVersion";

/// Routing/behavior switch resolved once per session from the capability bag.
///
/// V1 sessions are reached through the primary proxy route and use a local
/// forwarding listener; V2 sessions use the versioned route and speak to the
/// service directly, so no listener is started for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVariant {
	V1,
	V2,
}

impl ProtocolVariant {
	/// Resolves the variant from the capability bag.
	pub fn from_capabilities(capabilities: &Capabilities) -> Self {
		match capabilities.get(CAP_PROTOCOL_VERSION) {
			Some(CapabilityValue::Int(2)) => ProtocolVariant::V2,
			_ => ProtocolVariant::V1,
		}
	}

	/// Route segment appended to the base address for this variant.
	pub fn route(self) -> &'static str {
		match self {
			ProtocolVariant::V1 => "proxy",
			ProtocolVariant::V2 => "v2",
		}
	}
}

impl std::fmt::Display for ProtocolVariant {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ProtocolVariant::V1 => write!(f, "v1"),
			ProtocolVariant::V2 => write!(f, "v2"),
		}
	}
}

/// Body of `POST {base}/{route}/session`.
#[derive(Debug, Serialize)]
pub struct NewSessionRequest<'a> {
	#[serde(rename = "desiredCapabilities")]
	pub desired_capabilities: &'a Capabilities,
}

impl<'a> NewSessionRequest<'a> {
	/// Wraps a capability bag in the creation envelope.
	pub fn new(desired_capabilities: &'a Capabilities) -> Self {
		Self { desired_capabilities }
	}
}

/// Fields extracted from a session-creation response.
///
/// The service answers with a flat JSON object. Older deployments emit legacy
/// field names, so each field is read with a fallback alias; when both names
/// are present the primary wins. A body that does not parse as a JSON object
/// leaves every field unset — callers keep the raw body for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFields {
	pub session_id: Option<String>,
	pub live_view_url: Option<String>,
	pub test_report_url: Option<String>,
}

impl SessionFields {
	/// Parses a creation-response body, tolerating missing or aliased fields.
	pub fn parse(raw: &str) -> Self {
		let map: Map<String, Value> = match serde_json::from_str(raw) {
			Ok(Value::Object(map)) => map,
			_ => return Self::default(),
		};

		Self {
			session_id: first_string(&map, &["sessionId", "sessionID"]),
			live_view_url: first_string(&map, &["testLiveViewUrl", "testobject_test_live_view_url"]),
			test_report_url: first_string(&map, &["testReportUrl", "testobject_test_report_url"]),
		}
	}
}

/// Returns the first non-null string value among `names`, in order.
fn first_string(map: &Map<String, Value>, names: &[&str]) -> Option<String> {
	names.iter().find_map(|name| map.get(*name).and_then(Value::as_str).map(String::from))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn variant_defaults_to_v1() {
		let caps = Capabilities::new();
		assert_eq!(ProtocolVariant::from_capabilities(&caps), ProtocolVariant::V1);
	}

	#[test]
	fn variant_two_selects_v2() {
		let mut caps = Capabilities::new();
		caps.set(CAP_PROTOCOL_VERSION, 2);
		assert_eq!(ProtocolVariant::from_capabilities(&caps), ProtocolVariant::V2);
	}

	#[test]
	fn variant_other_values_select_v1() {
		let mut caps = Capabilities::new();
		caps.set(CAP_PROTOCOL_VERSION, 3);
		assert_eq!(ProtocolVariant::from_capabilities(&caps), ProtocolVariant::V1);

		// A string "2" is not the integer 2.
		caps.set(CAP_PROTOCOL_VERSION, "2");
		assert_eq!(ProtocolVariant::from_capabilities(&caps), ProtocolVariant::V1);
	}

	#[test]
	fn variant_routes() {
		assert_eq!(ProtocolVariant::V1.route(), "proxy");
		assert_eq!(ProtocolVariant::V2.route(), "v2");
	}

	#[test]
	fn creation_payload_nests_capabilities() {
		let mut caps = Capabilities::new();
		caps.set("deviceName", "Pixel 8");

		let payload = serde_json::to_value(NewSessionRequest::new(&caps)).unwrap();
		assert_eq!(payload["desiredCapabilities"]["deviceName"], "Pixel 8");
	}

	#[test]
	fn empty_capabilities_payload() {
		let caps = Capabilities::new();
		let payload = serde_json::to_string(&NewSessionRequest::new(&caps)).unwrap();
		assert_eq!(payload, r#"{"desiredCapabilities":{}}"#);
	}

	#[test]
	fn parses_primary_field_names() {
		let fields = SessionFields::parse(
			r#"{"sessionId":"abc123","testLiveViewUrl":"http://live/x","testReportUrl":"http://report/x"}"#,
		);
		assert_eq!(fields.session_id.as_deref(), Some("abc123"));
		assert_eq!(fields.live_view_url.as_deref(), Some("http://live/x"));
		assert_eq!(fields.test_report_url.as_deref(), Some("http://report/x"));
	}

	#[test]
	fn parses_fallback_field_names() {
		let fields = SessionFields::parse(
			r#"{"sessionID":"abc123","testobject_test_live_view_url":"http://live/x","testobject_test_report_url":"http://report/x"}"#,
		);
		assert_eq!(fields.session_id.as_deref(), Some("abc123"));
		assert_eq!(fields.live_view_url.as_deref(), Some("http://live/x"));
		assert_eq!(fields.test_report_url.as_deref(), Some("http://report/x"));
	}

	#[test]
	fn primary_wins_when_both_names_present() {
		let fields = SessionFields::parse(r#"{"sessionId":"primary","sessionID":"fallback"}"#);
		assert_eq!(fields.session_id.as_deref(), Some("primary"));
	}

	#[test]
	fn null_primary_falls_back() {
		let fields = SessionFields::parse(r#"{"sessionId":null,"sessionID":"fallback"}"#);
		assert_eq!(fields.session_id.as_deref(), Some("fallback"));
	}

	#[test]
	fn missing_fields_stay_unset() {
		let fields = SessionFields::parse(r#"{"sessionId":"abc123"}"#);
		assert_eq!(fields.session_id.as_deref(), Some("abc123"));
		assert_eq!(fields.live_view_url, None);
		assert_eq!(fields.test_report_url, None);
	}

	#[test]
	fn non_json_body_parses_to_empty_fields() {
		assert_eq!(SessionFields::parse("device allocation pending"), SessionFields::default());
		assert_eq!(SessionFields::parse("[1,2,3]"), SessionFields::default());
	}
}
