// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use thiserror::Error;

/// Result type alias for dispatcher operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failures raised by the dispatcher before, during, or after a remote call.
///
/// Application-level failures (an envelope with `success: false`) are not
/// errors at this layer; they travel inside the [`crate::Envelope`].
#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum BridgeError {
	/// No endpoint is attached to the dispatcher.
	#[error("bridge endpoint is not ready")]
	EndpointNotReady,

	/// The attached endpoint does not expose the named operation.
	#[error("unknown operation: {0}")]
	UnknownOperation(String),

	/// The remote call completed with a rejection.
	#[error("remote call rejected: {0}")]
	RemoteRejected(String),

	/// The call did not resolve within the configured call timeout.
	#[error("remote call timed out after {0:?}")]
	Timeout(Duration),

	/// The remote returned a payload that does not fit the declared shape.
	#[error("invalid result from {operation}: {message}")]
	InvalidResult { operation: String, message: String },
}

impl BridgeError {
	pub fn invalid_result(operation: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidResult {
			operation: operation.into(),
			message: message.into(),
		}
	}

	/// True for the two precondition failures that are raised before any call is issued.
	pub fn is_precondition(&self) -> bool {
		matches!(self, Self::EndpointNotReady | Self::UnknownOperation(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_operation_names_the_operation() {
		let err = BridgeError::UnknownOperation("verify_visual_result".to_string());
		assert_eq!(err.to_string(), "unknown operation: verify_visual_result");
		assert!(err.is_precondition());
	}

	#[test]
	fn rejection_is_not_a_precondition() {
		let err = BridgeError::RemoteRejected("boom".to_string());
		assert!(!err.is_precondition());
		assert_eq!(err.to_string(), "remote call rejected: boom");
	}

	#[test]
	fn invalid_result_formats_operation() {
		let err = BridgeError::invalid_result("get_screen_frame", "missing field `image`");
		assert_eq!(
			err.to_string(),
			"invalid result from get_screen_frame: missing field `image`"
		);
	}
}
