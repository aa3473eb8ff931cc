// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use flowtest_common_bridge::{BridgeResult, Dispatcher};

use crate::operations::{GET_VERSION, PING};

/// Liveness and version of the host. These answer with plain strings, not envelopes.
#[derive(Clone)]
pub struct HostInfo {
	dispatcher: Arc<Dispatcher>,
}

impl HostInfo {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub async fn ping(&self) -> BridgeResult<String> {
		self.dispatcher.invoke(PING, vec![]).await
	}

	pub async fn version(&self) -> BridgeResult<String> {
		self.dispatcher.invoke(GET_VERSION, vec![]).await
	}
}
