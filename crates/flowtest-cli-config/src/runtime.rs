// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fully resolved configuration.

use flowtest_common_bridge::ConnectOptions;
use flowtest_workflows::{AiConfig, MonitorConfig};

use crate::layer::ConfigLayer;
use crate::paths::PathsConfig;
use crate::sections::{AiSettings, BridgeConfig, LoggingSettings, MonitorSettings, StressSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowtestConfig {
	pub bridge: BridgeConfig,
	pub monitor: MonitorSettings,
	pub stress: StressSettings,
	pub ai: AiSettings,
	pub logging: LoggingSettings,
	pub paths: PathsConfig,
}

impl FlowtestConfig {
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Self {
		Self {
			bridge: layer.bridge.unwrap_or_default().finalize(),
			monitor: layer.monitor.unwrap_or_default().finalize(),
			stress: layer.stress.unwrap_or_default().finalize(),
			ai: layer.ai.unwrap_or_default().finalize(),
			logging: layer.logging.unwrap_or_default().finalize(),
			paths,
		}
	}

	pub fn connect_options(&self) -> ConnectOptions {
		ConnectOptions {
			host: self.bridge.host.clone(),
			port: self.bridge.port,
			token: self.bridge.token.clone(),
			connect_timeout: self.bridge.connect_timeout,
		}
	}

	pub fn monitor_config(&self) -> MonitorConfig {
		MonitorConfig {
			cadence: self.monitor.cadence,
			frame_ordering: self.monitor.frame_ordering,
		}
	}

	pub fn ai_config(&self) -> AiConfig {
		AiConfig {
			base_url: self.ai.base_url.clone(),
			require_credential: self.ai.require_credential,
		}
	}
}

impl Default for FlowtestConfig {
	fn default() -> Self {
		Self::from_layer(ConfigLayer::default(), PathsConfig::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flowtest_workflows::FrameOrdering;
	use std::time::Duration;

	#[test]
	fn test_defaults_map_onto_workflow_configs() {
		let config = FlowtestConfig::default();
		assert_eq!(
			config.monitor_config(),
			MonitorConfig {
				cadence: Duration::from_millis(500),
				frame_ordering: FrameOrdering::DiscardStale,
			}
		);
		assert_eq!(config.ai_config(), AiConfig::default());
		assert_eq!(config.connect_options().addr(), "127.0.0.1:4733");
		assert_eq!(config.stress.default_iterations, 10);
	}
}
