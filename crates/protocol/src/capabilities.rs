//! Caller-owned capability bag sent with session creation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single capability value: string, integer, or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
	/// Free-form string value (device names, app ids, API keys).
	Str(String),
	/// Integer value (versions, timeouts).
	Int(i64),
	/// Boolean toggle.
	Bool(bool),
}

impl From<&str> for CapabilityValue {
	fn from(value: &str) -> Self {
		CapabilityValue::Str(value.to_string())
	}
}

impl From<String> for CapabilityValue {
	fn from(value: String) -> Self {
		CapabilityValue::Str(value)
	}
}

impl From<i64> for CapabilityValue {
	fn from(value: i64) -> Self {
		CapabilityValue::Int(value)
	}
}

impl From<bool> for CapabilityValue {
	fn from(value: bool) -> Self {
		CapabilityValue::Bool(value)
	}
}

/// Flat mapping of capability names to values.
///
/// Owned by the caller and handed to the supervisor at construction. The
/// supervisor reads it once, when the session is opened; mutating the bag
/// after that has no effect on the running session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(HashMap<String, CapabilityValue>);

impl Capabilities {
	/// Creates an empty capability bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a capability, replacing any previous value under the same name.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<CapabilityValue>) {
		self.0.insert(name.into(), value.into());
	}

	/// Returns the value for `name`, if set.
	pub fn get(&self, name: &str) -> Option<&CapabilityValue> {
		self.0.get(name)
	}

	/// Returns the integer value for `name`, if set to an integer.
	pub fn get_int(&self, name: &str) -> Option<i64> {
		match self.0.get(name) {
			Some(CapabilityValue::Int(value)) => Some(*value),
			_ => None,
		}
	}

	/// Number of capabilities in the bag.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the bag is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over `(name, value)` pairs in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &CapabilityValue)> {
		self.0.iter()
	}
}
