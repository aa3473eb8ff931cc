// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The result contract shared by every host operation.
//!
//! Every operation answers with `{ success, error?, message?, ...fields }`.
//! [`Envelope`] keeps that wire shape read-only, and [`Envelope::into_outcome`]
//! turns it into an explicit [`Outcome`] so callers never have to guess which
//! optional fields are valid to read.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{BridgeError, BridgeResult};

/// Error used when a failed envelope carries no `error` text.
pub const UNSPECIFIED_FAILURE: &str = "operation reported failure without an error message";

/// Wire envelope returned by a host operation.
///
/// Fields are private: an envelope is immutable once received. Operation
/// fields are only decoded when `success` is true, so a failed envelope with
/// odd leftovers still yields its error text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope<F> {
	success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<String>,
	#[serde(flatten)]
	fields: Option<F>,
}

#[derive(Deserialize)]
struct RawEnvelope {
	success: bool,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(flatten)]
	rest: Map<String, Value>,
}

impl<'de, F: DeserializeOwned> Deserialize<'de> for Envelope<F> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = RawEnvelope::deserialize(deserializer)?;
		let fields = if raw.success {
			Some(F::deserialize(Value::Object(raw.rest)).map_err(D::Error::custom)?)
		} else {
			None
		};
		Ok(Self {
			success: raw.success,
			error: raw.error,
			message: raw.message,
			fields,
		})
	}
}

/// Operation-specific fields for operations that only use the base contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoFields {}

/// A success-side payload violated its operation's declared shape.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ContractViolation(pub String);

impl ContractViolation {
	pub fn missing(field: &str) -> Self {
		Self(format!("missing field `{field}`"))
	}
}

/// Maps the optional wire fields of one operation onto its typed success value.
///
/// `into_value` is only called for `success: true` envelopes and must fail
/// when a field the operation declares mandatory is absent.
pub trait ResultShape: Sized {
	type Value;

	fn into_value(self) -> Result<Self::Value, ContractViolation>;
}

impl ResultShape for NoFields {
	type Value = ();

	fn into_value(self) -> Result<(), ContractViolation> {
		Ok(())
	}
}

/// Tagged view of an envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
	Succeeded { value: T, message: Option<String> },
	Failed { error: String },
}

impl<T> Outcome<T> {
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Succeeded { .. })
	}

	pub fn into_result(self) -> Result<T, String> {
		match self {
			Self::Succeeded { value, .. } => Ok(value),
			Self::Failed { error } => Err(error),
		}
	}
}

impl<F> Envelope<F> {
	pub fn succeeded(fields: F, message: Option<String>) -> Self {
		Self {
			success: true,
			error: None,
			message,
			fields: Some(fields),
		}
	}

	/// A failed envelope, used both by host doubles and to synthesize a local
	/// failure when the remote call itself never produced an envelope.
	pub fn failed(error: impl Into<String>) -> Self {
		Self {
			success: false,
			error: Some(error.into()),
			message: None,
			fields: None,
		}
	}

	pub fn is_success(&self) -> bool {
		self.success
	}

	/// The failure text. Always `Some` for a failed envelope.
	pub fn error(&self) -> Option<&str> {
		if self.success {
			return None;
		}
		Some(self.error.as_deref().unwrap_or(UNSPECIFIED_FAILURE))
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	/// Operation fields, only readable on a successful envelope.
	pub fn fields(&self) -> Option<&F> {
		self.fields.as_ref().filter(|_| self.success)
	}

	/// Convert into a tagged outcome, checking the operation's mandatory fields.
	pub fn into_outcome(self, operation: &str) -> BridgeResult<Outcome<F::Value>>
	where
		F: ResultShape,
	{
		if !self.success {
			return Ok(Outcome::Failed {
				error: self
					.error
					.unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string()),
			});
		}
		let Some(fields) = self.fields else {
			return Err(BridgeError::invalid_result(operation, "missing result fields"));
		};
		let value = fields
			.into_value()
			.map_err(|violation| BridgeError::invalid_result(operation, violation.0))?;
		Ok(Outcome::Succeeded {
			value,
			message: self.message,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
	struct PidFields {
		#[serde(default)]
		pid: Option<u32>,
		#[serde(default)]
		path: Option<String>,
	}

	impl ResultShape for PidFields {
		type Value = u32;

		fn into_value(self) -> Result<u32, ContractViolation> {
			self.pid.ok_or_else(|| ContractViolation::missing("pid"))
		}
	}

	#[test]
	fn success_envelope_exposes_fields() {
		let envelope: Envelope<PidFields> =
			serde_json::from_value(json!({"success": true, "pid": 4242, "path": "/opt/app"}))
				.expect("envelope to parse");
		assert!(envelope.is_success());
		assert_eq!(envelope.error(), None);
		assert_eq!(envelope.fields().and_then(|f| f.pid), Some(4242));
		assert_eq!(
			envelope.into_outcome("launch_target_app"),
			Ok(Outcome::Succeeded {
				value: 4242,
				message: None
			})
		);
	}

	#[test]
	fn failed_envelope_hides_fields() {
		let envelope: Envelope<PidFields> =
			serde_json::from_value(json!({"success": false, "error": "not found", "pid": 1}))
				.expect("envelope to parse");
		assert_eq!(envelope.fields(), None);
		assert_eq!(envelope.error(), Some("not found"));
		assert_eq!(
			envelope.into_outcome("launch_target_app"),
			Ok(Outcome::Failed {
				error: "not found".to_string()
			})
		);
	}

	#[test]
	fn failed_envelope_ignores_malformed_leftover_fields() {
		let envelope: Envelope<PidFields> = serde_json::from_value(json!({
			"success": false,
			"error": "target executable not found",
			"pid": -1,
			"path": ["not", "a", "string"]
		}))
		.expect("failed envelope to parse despite leftovers");
		assert_eq!(envelope.fields(), None);
		assert_eq!(
			envelope.into_outcome("launch_target_app"),
			Ok(Outcome::Failed {
				error: "target executable not found".to_string()
			})
		);
	}

	#[test]
	fn success_envelope_with_mistyped_field_is_rejected() {
		let parsed =
			serde_json::from_value::<Envelope<PidFields>>(json!({"success": true, "pid": -1}));
		assert!(parsed.is_err());
	}

	#[test]
	fn failed_envelope_without_error_is_normalised() {
		let envelope: Envelope<NoFields> =
			serde_json::from_value(json!({"success": false})).expect("envelope to parse");
		assert_eq!(envelope.error(), Some(UNSPECIFIED_FAILURE));
	}

	#[test]
	fn missing_mandatory_field_is_invalid_result() {
		let envelope: Envelope<PidFields> =
			serde_json::from_value(json!({"success": true})).expect("envelope to parse");
		assert_eq!(
			envelope.into_outcome("launch_target_app"),
			Err(BridgeError::invalid_result(
				"launch_target_app",
				"missing field `pid`"
			))
		);
	}

	#[test]
	fn base_only_envelope_parses_message() {
		let envelope: Envelope<NoFields> =
			serde_json::from_value(json!({"success": true, "message": "API Key set"}))
				.expect("envelope to parse");
		assert_eq!(envelope.message(), Some("API Key set"));
		assert!(envelope.into_outcome("set_ai_api_key").unwrap().is_success());
	}

	#[test]
	fn synthesized_failure_serializes_without_optional_fields() {
		let envelope: Envelope<NoFields> = Envelope::failed("bridge endpoint is not ready");
		let value = serde_json::to_value(&envelope).expect("envelope to serialize");
		assert_eq!(
			value,
			json!({"success": false, "error": "bridge endpoint is not ready"})
		);
	}

	proptest! {
		#[test]
		fn failure_never_exposes_fields(
			pid in prop_oneof![
				any::<u32>().prop_map(|n| json!(n)),
				any::<i64>().prop_map(|n| json!(n)),
				".*".prop_map(|s| json!(s)),
				Just(json!(null)),
			],
			error in proptest::option::of(".*"),
		) {
			let mut raw = json!({"success": false, "pid": pid});
			if let Some(error) = &error {
				raw["error"] = json!(error);
			}
			let envelope: Envelope<PidFields> = serde_json::from_value(raw).unwrap();
			prop_assert_eq!(envelope.fields(), None);

			let expected = error.unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string());
			prop_assert_eq!(
				envelope.into_outcome("launch_target_app"),
				Ok(Outcome::Failed { error: expected })
			);
		}
	}
}
