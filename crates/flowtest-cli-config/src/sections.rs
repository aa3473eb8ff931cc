// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-section partial layers and their finalized settings.

use std::time::Duration;

use flowtest_common_bridge::SecretString;
use flowtest_workflows::{FrameOrdering, DEFAULT_ITERATIONS};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4733;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CADENCE_MS: u64 = 500;
pub const DEFAULT_LOG_LEVEL: &str = "info";

macro_rules! overlay {
	($self:ident, $other:ident, $($field:ident),+ $(,)?) => {
		$(
			if $other.$field.is_some() {
				$self.$field = $other.$field;
			}
		)+
	};
}

// --- bridge ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfigLayer {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub token: Option<String>,
	pub connect_timeout_secs: Option<u64>,
	/// `0` disables the call timeout.
	pub call_timeout_secs: Option<u64>,
}

impl BridgeConfigLayer {
	pub fn merge(&mut self, other: Self) {
		overlay!(self, other, host, port, token, connect_timeout_secs, call_timeout_secs);
	}

	pub fn finalize(self) -> BridgeConfig {
		BridgeConfig {
			host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port: self.port.unwrap_or(DEFAULT_PORT),
			token: self
				.token
				.filter(|t| !t.trim().is_empty())
				.map(SecretString::from),
			connect_timeout: Duration::from_secs(
				self
					.connect_timeout_secs
					.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
			),
			call_timeout: self
				.call_timeout_secs
				.filter(|secs| *secs > 0)
				.map(Duration::from_secs),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
	pub host: String,
	pub port: u16,
	pub token: Option<SecretString>,
	pub connect_timeout: Duration,
	pub call_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		BridgeConfigLayer::default().finalize()
	}
}

// --- monitor ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfigLayer {
	pub cadence_ms: Option<u64>,
	pub frame_ordering: Option<FrameOrdering>,
}

impl MonitorConfigLayer {
	pub fn merge(&mut self, other: Self) {
		overlay!(self, other, cadence_ms, frame_ordering);
	}

	pub fn finalize(self) -> MonitorSettings {
		MonitorSettings {
			cadence: Duration::from_millis(self.cadence_ms.unwrap_or(DEFAULT_CADENCE_MS)),
			frame_ordering: self.frame_ordering.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
	pub cadence: Duration,
	pub frame_ordering: FrameOrdering,
}

// --- stress ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StressConfigLayer {
	pub default_iterations: Option<i64>,
}

impl StressConfigLayer {
	pub fn merge(&mut self, other: Self) {
		overlay!(self, other, default_iterations);
	}

	pub fn finalize(self) -> StressSettings {
		StressSettings {
			default_iterations: self
				.default_iterations
				.unwrap_or(i64::from(DEFAULT_ITERATIONS)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressSettings {
	pub default_iterations: i64,
}

// --- ai ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiConfigLayer {
	pub base_url: Option<String>,
	pub require_credential: Option<bool>,
}

impl AiConfigLayer {
	pub fn merge(&mut self, other: Self) {
		overlay!(self, other, base_url, require_credential);
	}

	pub fn finalize(self) -> AiSettings {
		AiSettings {
			base_url: self.base_url.filter(|url| !url.trim().is_empty()),
			require_credential: self.require_credential.unwrap_or(false),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiSettings {
	pub base_url: Option<String>,
	pub require_credential: bool,
}

// --- logging ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		overlay!(self, other, level);
	}

	pub fn finalize(self) -> LoggingSettings {
		LoggingSettings {
			level: self.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
	/// An `EnvFilter` directive such as `info` or `flowtest_workflows=debug`.
	pub level: String,
}
