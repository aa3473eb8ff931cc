// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::envelope::{Envelope, Outcome, ResultShape};
use crate::error::{BridgeError, BridgeResult};

/// Typed invocation of named host operations.
///
/// The dispatcher verifies that an endpoint is attached and that it exposes
/// the requested operation, then forwards the call exactly once. It never
/// retries, queues or inspects the returned payload beyond decoding it into
/// the caller's declared type.
pub struct Dispatcher {
	endpoint: RwLock<Option<Arc<dyn Endpoint>>>,
	call_timeout: Option<Duration>,
}

impl Default for Dispatcher {
	fn default() -> Self {
		Self::new()
	}
}

impl Dispatcher {
	/// A dispatcher with no endpoint attached yet.
	pub fn new() -> Self {
		Self {
			endpoint: RwLock::new(None),
			call_timeout: None,
		}
	}

	pub fn with_endpoint(endpoint: Arc<dyn Endpoint>) -> Self {
		Self {
			endpoint: RwLock::new(Some(endpoint)),
			call_timeout: None,
		}
	}

	/// Fail calls that have not resolved within `call_timeout`. `None` waits forever.
	pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
		self.call_timeout = call_timeout;
		self
	}

	pub fn call_timeout(&self) -> Option<Duration> {
		self.call_timeout
	}

	pub async fn attach(&self, endpoint: Arc<dyn Endpoint>) {
		*self.endpoint.write().await = Some(endpoint);
	}

	pub async fn detach(&self) -> Option<Arc<dyn Endpoint>> {
		self.endpoint.write().await.take()
	}

	pub async fn is_ready(&self) -> bool {
		self
			.endpoint
			.read()
			.await
			.as_ref()
			.is_some_and(|endpoint| endpoint.is_ready())
	}

	/// Invoke `operation` and decode its result into `R`.
	pub async fn invoke<R: DeserializeOwned>(
		&self,
		operation: &str,
		args: Vec<Value>,
	) -> BridgeResult<R> {
		let value = self.invoke_raw(operation, args).await?;
		serde_json::from_value(value)
			.map_err(|e| BridgeError::invalid_result(operation, e.to_string()))
	}

	/// Invoke an operation that answers with the shared result envelope.
	pub async fn invoke_envelope<F>(
		&self,
		operation: &str,
		args: Vec<Value>,
	) -> BridgeResult<Outcome<F::Value>>
	where
		F: ResultShape + DeserializeOwned,
	{
		self
			.invoke::<Envelope<F>>(operation, args)
			.await?
			.into_outcome(operation)
	}

	/// Invoke `operation` and return the host's payload untouched.
	pub async fn invoke_raw(&self, operation: &str, args: Vec<Value>) -> BridgeResult<Value> {
		let endpoint = {
			let slot = self.endpoint.read().await;
			match slot.as_ref() {
				Some(endpoint) if endpoint.is_ready() => Arc::clone(endpoint),
				_ => {
					warn!(operation, "[dispatch] endpoint not ready");
					return Err(BridgeError::EndpointNotReady);
				}
			}
		};

		if !endpoint.has_operation(operation) {
			warn!(operation, "[dispatch] unknown operation");
			return Err(BridgeError::UnknownOperation(operation.to_string()));
		}

		let start = Instant::now();
		debug!(operation, args = args.len(), "[dispatch] →");

		let result = match self.call_timeout {
			Some(limit) => match timeout(limit, endpoint.call(operation, args)).await {
				Ok(result) => result.map_err(BridgeError::RemoteRejected),
				Err(_) => Err(BridgeError::Timeout(limit)),
			},
			None => endpoint
				.call(operation, args)
				.await
				.map_err(BridgeError::RemoteRejected),
		};

		let elapsed = start.elapsed();
		match &result {
			Ok(_) => debug!(operation, ?elapsed, "[dispatch] ← ok"),
			Err(e) => info!(operation, ?elapsed, error = %e, "[dispatch] ← error"),
		}

		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::ScriptedEndpoint;
	use serde_json::json;

	#[tokio::test]
	async fn no_endpoint_is_not_ready() {
		let dispatcher = Dispatcher::new();
		assert!(!dispatcher.is_ready().await);
		let result = dispatcher.invoke_raw("ping", vec![]).await;
		assert_eq!(result, Err(BridgeError::EndpointNotReady));
	}

	#[tokio::test]
	async fn unknown_operation_issues_no_call() {
		let endpoint = Arc::new(ScriptedEndpoint::new().respond("ping", json!("pong")));
		let dispatcher = Dispatcher::with_endpoint(endpoint.clone());

		let result = dispatcher
			.invoke_raw("verify_visual_result", vec![json!("circle")])
			.await;

		assert_eq!(
			result,
			Err(BridgeError::UnknownOperation(
				"verify_visual_result".to_string()
			))
		);
		assert!(endpoint.calls().is_empty());
	}

	#[tokio::test]
	async fn forwards_arguments_in_order_exactly_once() {
		let endpoint = Arc::new(
			ScriptedEndpoint::new().respond("set_ai_api_key", json!({"success": true})),
		);
		let dispatcher = Dispatcher::with_endpoint(endpoint.clone());

		let value = dispatcher
			.invoke_raw("set_ai_api_key", vec![json!("key"), Value::Null])
			.await
			.expect("call to succeed");

		assert_eq!(value, json!({"success": true}));
		let calls = endpoint.calls();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].operation, "set_ai_api_key");
		assert_eq!(calls[0].args, vec![json!("key"), Value::Null]);
	}

	#[tokio::test]
	async fn rejection_propagates_message() {
		let endpoint = Arc::new(ScriptedEndpoint::new().reject("get_screen_frame", "display gone"));
		let dispatcher = Dispatcher::with_endpoint(endpoint);

		let result = dispatcher.invoke_raw("get_screen_frame", vec![]).await;
		assert_eq!(
			result,
			Err(BridgeError::RemoteRejected("display gone".to_string()))
		);
	}

	#[tokio::test]
	async fn decode_failure_is_invalid_result() {
		let endpoint = Arc::new(ScriptedEndpoint::new().respond("get_version", json!(42)));
		let dispatcher = Dispatcher::with_endpoint(endpoint);

		let result: BridgeResult<String> = dispatcher.invoke("get_version", vec![]).await;
		assert!(matches!(
			result,
			Err(BridgeError::InvalidResult { ref operation, .. }) if operation == "get_version"
		));
	}

	#[tokio::test]
	async fn attach_and_detach_toggle_readiness() {
		let dispatcher = Dispatcher::new();
		dispatcher
			.attach(Arc::new(ScriptedEndpoint::new().respond("ping", json!("pong"))))
			.await;
		assert!(dispatcher.is_ready().await);

		let pong: String = dispatcher.invoke("ping", vec![]).await.expect("ping");
		assert_eq!(pong, "pong");

		assert!(dispatcher.detach().await.is_some());
		assert_eq!(
			dispatcher.invoke_raw("ping", vec![]).await,
			Err(BridgeError::EndpointNotReady)
		);
	}

	#[tokio::test]
	async fn endpoint_that_lost_its_connection_is_not_ready() {
		let endpoint = Arc::new(ScriptedEndpoint::new().respond("ping", json!("pong")));
		let dispatcher = Dispatcher::with_endpoint(endpoint.clone());
		endpoint.set_ready(false);

		assert!(!dispatcher.is_ready().await);
		assert_eq!(
			dispatcher.invoke_raw("ping", vec![]).await,
			Err(BridgeError::EndpointNotReady)
		);
		assert_eq!(endpoint.call_count("ping"), 0);
	}

	#[tokio::test]
	async fn envelope_invocation_yields_tagged_outcome() {
		let endpoint = Arc::new(
			ScriptedEndpoint::new()
				.respond("close_target_app", json!({"success": false, "error": "not running"})),
		);
		let dispatcher = Dispatcher::with_endpoint(endpoint);

		let outcome = dispatcher
			.invoke_envelope::<crate::NoFields>("close_target_app", vec![])
			.await
			.expect("envelope to decode");
		assert_eq!(
			outcome,
			Outcome::Failed {
				error: "not running".to_string()
			}
		);
	}

	#[derive(Debug, serde::Deserialize)]
	struct LaunchedPid {
		pid: Option<u32>,
	}

	impl crate::ResultShape for LaunchedPid {
		type Value = u32;

		fn into_value(self) -> Result<u32, crate::ContractViolation> {
			self.pid.ok_or_else(|| crate::ContractViolation::missing("pid"))
		}
	}

	#[tokio::test]
	async fn failed_envelope_with_sentinel_pid_reports_host_error() {
		let endpoint = Arc::new(ScriptedEndpoint::new().respond(
			"launch_target_app",
			json!({"success": false, "error": "target executable not found", "pid": -1}),
		));
		let dispatcher = Dispatcher::with_endpoint(endpoint);

		let outcome = dispatcher
			.invoke_envelope::<LaunchedPid>("launch_target_app", vec![json!("/missing")])
			.await
			.expect("failed envelope to decode");
		assert_eq!(
			outcome,
			Outcome::Failed {
				error: "target executable not found".to_string()
			}
		);
	}

	#[tokio::test(start_paused = true)]
	async fn call_timeout_policy_fails_hanging_calls() {
		let endpoint = Arc::new(ScriptedEndpoint::new().respond_after(
			"run_stress_test",
			Duration::from_secs(600),
			json!({"success": true}),
		));
		let dispatcher =
			Dispatcher::with_endpoint(endpoint).with_call_timeout(Some(Duration::from_secs(5)));

		let result = dispatcher
			.invoke_raw("run_stress_test", vec![json!(10)])
			.await;
		assert_eq!(result, Err(BridgeError::Timeout(Duration::from_secs(5))));
	}
}
