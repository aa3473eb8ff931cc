// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use flowtest_common_bridge::{BridgeError, Envelope, Outcome};
use thiserror::Error;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Where a workflow failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
	EndpointNotReady,
	UnknownOperation,
	RemoteRejected,
	Timeout,
	InvalidResult,
	/// The host answered with `success: false`.
	ApplicationReportedFailure,
	/// Rejected locally before any remote call.
	LocalValidationFailure,
	/// Another call of the same workflow is still outstanding.
	Busy,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
	#[error("{0}")]
	Validation(String),

	#[error("{0}")]
	Reported(String),

	#[error(transparent)]
	Bridge(#[from] BridgeError),

	#[error("{0} already in progress")]
	Busy(&'static str),
}

impl WorkflowError {
	pub fn validation(message: impl Into<String>) -> Self {
		Self::Validation(message.into())
	}

	pub fn kind(&self) -> FailureKind {
		match self {
			Self::Validation(_) => FailureKind::LocalValidationFailure,
			Self::Reported(_) => FailureKind::ApplicationReportedFailure,
			Self::Busy(_) => FailureKind::Busy,
			Self::Bridge(e) => match e {
				BridgeError::EndpointNotReady => FailureKind::EndpointNotReady,
				BridgeError::UnknownOperation(_) => FailureKind::UnknownOperation,
				BridgeError::RemoteRejected(_) => FailureKind::RemoteRejected,
				BridgeError::Timeout(_) => FailureKind::Timeout,
				BridgeError::InvalidResult { .. } => FailureKind::InvalidResult,
			},
		}
	}

	/// A failed envelope carrying this error's text, for surfaces that speak envelopes.
	pub fn into_envelope<F>(&self) -> Envelope<F> {
		Envelope::failed(self.to_string())
	}
}

/// Unwrap a successful outcome, turning a host-reported failure into [`WorkflowError::Reported`].
pub fn succeeded<T>(outcome: Outcome<T>) -> WorkflowResult<(T, Option<String>)> {
	match outcome {
		Outcome::Succeeded { value, message } => Ok((value, message)),
		Outcome::Failed { error } => Err(WorkflowError::Reported(error)),
	}
}
