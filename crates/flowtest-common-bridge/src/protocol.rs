// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Newline-delimited JSON-RPC spoken with the host bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

// --- JSON-RPC types ---

#[derive(Debug, Serialize)]
pub struct Request<'a> {
	pub id: u64,
	pub method: &'a str,
	pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcError {
	pub code: String,
	pub message: String,
}

/// Host→client message: either the answer to a request or an unsolicited event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
	Success { id: u64, result: Value },
	Error { id: u64, error: RpcError },
	Event {
		method: String,
		#[serde(default)]
		params: Value,
	},
}

// --- Method names ---

pub const METHOD_AUTH: &str = "auth";
pub const METHOD_LIST_OPERATIONS: &str = "list_operations";

// --- Handshake payloads ---

#[derive(Debug, Serialize)]
pub struct AuthParams<'a> {
	pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResult {
	#[serde(default)]
	pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct OperationsResult {
	pub operations: Vec<String>,
}

// --- Events ---

pub const EVENT_TARGET_EXITED: &str = "target_exited";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetExitedParams {
	#[serde(default)]
	pub pid: Option<u32>,
	#[serde(default)]
	pub exit_code: Option<i32>,
}

/// Unsolicited notification from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
	/// The target application exited outside of a `close` call.
	TargetExited {
		pid: Option<u32>,
		exit_code: Option<i32>,
	},
	Other {
		method: String,
		params: Value,
	},
}

impl HostEvent {
	/// Params that do not parse leave the event as [`HostEvent::Other`], so a
	/// garbled `target_exited` never reads as "whatever is running exited".
	pub fn from_wire(method: String, params: Value) -> Self {
		if method == EVENT_TARGET_EXITED {
			let parsed = if params.is_null() {
				Ok(TargetExitedParams::default())
			} else {
				serde_json::from_value::<TargetExitedParams>(params.clone())
			};
			match parsed {
				Ok(exited) => {
					return Self::TargetExited {
						pid: exited.pid,
						exit_code: exited.exit_code,
					}
				}
				Err(e) => warn!(%method, error = %e, "target_exited params did not parse"),
			}
		}
		Self::Other { method, params }
	}
}
