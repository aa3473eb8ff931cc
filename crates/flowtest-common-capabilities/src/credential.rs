// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use flowtest_common_bridge::{BridgeResult, Dispatcher, NoFields, Outcome, SecretString};
use serde_json::Value;

use crate::operations::SET_AI_API_KEY;

/// Hands an AI credential to the host. Nothing is retained here.
#[derive(Clone)]
pub struct CredentialProvisioning {
	dispatcher: Arc<Dispatcher>,
}

impl CredentialProvisioning {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	/// Send `key` and an optional endpoint override; `None` lets the host keep its default.
	pub async fn provision(
		&self,
		key: &SecretString,
		base_url: Option<&str>,
	) -> BridgeResult<Outcome<()>> {
		let args = vec![
			Value::String(key.expose().to_string()),
			base_url.map_or(Value::Null, |url| Value::String(url.to_string())),
		];
		self
			.dispatcher
			.invoke_envelope::<NoFields>(SET_AI_API_KEY, args)
			.await
	}
}
