// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`Endpoint`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::endpoint::Endpoint;

pub type Handler =
	Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
	pub operation: String,
	pub args: Vec<Value>,
}

/// Endpoint whose operations are scripted closures. Every call is recorded.
pub struct ScriptedEndpoint {
	handlers: HashMap<String, Handler>,
	calls: Mutex<Vec<RecordedCall>>,
	ready: AtomicBool,
}

impl Default for ScriptedEndpoint {
	fn default() -> Self {
		Self::new()
	}
}

impl ScriptedEndpoint {
	pub fn new() -> Self {
		Self {
			handlers: HashMap::new(),
			calls: Mutex::new(Vec::new()),
			ready: AtomicBool::new(true),
		}
	}

	/// Script `operation` with an async handler.
	pub fn on<F>(mut self, operation: &str, handler: F) -> Self
	where
		F: Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, String>> + Send + Sync + 'static,
	{
		self.handlers.insert(operation.to_string(), Arc::new(handler));
		self
	}

	/// Answer `operation` immediately with `value`.
	pub fn respond(self, operation: &str, value: Value) -> Self {
		self.on(operation, move |_| {
			let value = value.clone();
			async move { Ok(value) }.boxed()
		})
	}

	/// Answer `operation` with `value` after `delay`.
	pub fn respond_after(self, operation: &str, delay: Duration, value: Value) -> Self {
		self.on(operation, move |_| {
			let value = value.clone();
			async move {
				tokio::time::sleep(delay).await;
				Ok(value)
			}
			.boxed()
		})
	}

	/// Reject `operation` at the transport level.
	pub fn reject(self, operation: &str, message: &str) -> Self {
		let message = message.to_string();
		self.on(operation, move |_| {
			let message = message.clone();
			async move { Err(message) }.boxed()
		})
	}

	pub fn set_ready(&self, ready: bool) {
		self.ready.store(ready, Ordering::SeqCst);
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.lock_calls().clone()
	}

	pub fn call_count(&self, operation: &str) -> usize {
		self
			.lock_calls()
			.iter()
			.filter(|call| call.operation == operation)
			.count()
	}

	fn lock_calls(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
		self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[async_trait]
impl Endpoint for ScriptedEndpoint {
	fn is_ready(&self) -> bool {
		self.ready.load(Ordering::SeqCst)
	}

	fn has_operation(&self, operation: &str) -> bool {
		self.handlers.contains_key(operation)
	}

	async fn call(&self, operation: &str, args: Vec<Value>) -> Result<Value, String> {
		self.lock_calls().push(RecordedCall {
			operation: operation.to_string(),
			args: args.clone(),
		});
		match self.handlers.get(operation) {
			Some(handler) => handler(args).await,
			None => Err(format!("no handler scripted for {operation}")),
		}
	}
}
