// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use serde_json::Value;

/// The boundary object exposing named host operations.
///
/// Implementations forward a call exactly once and report rejections as the
/// host's own message; the [`crate::Dispatcher`] owns every check around it.
#[async_trait]
pub trait Endpoint: Send + Sync {
	/// False once the underlying connection is gone.
	fn is_ready(&self) -> bool {
		true
	}

	/// Whether the host exposes `operation`.
	fn has_operation(&self, operation: &str) -> bool;

	/// Invoke `operation` with positional arguments.
	async fn call(&self, operation: &str, args: Vec<Value>) -> Result<Value, String>;
}
