// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use flowtest_workflows::{MAX_ITERATIONS, MIN_ITERATIONS};

use crate::error::ConfigError;
use crate::runtime::FlowtestConfig;

pub const MIN_CADENCE: Duration = Duration::from_millis(50);
pub const MAX_CADENCE: Duration = Duration::from_secs(60);

/// Reject values that would make the resolved configuration unusable.
pub fn validate(config: &FlowtestConfig) -> Result<(), ConfigError> {
	if config.bridge.host.trim().is_empty() {
		return Err(ConfigError::invalid_value("bridge.host", "must not be empty"));
	}
	if config.bridge.port == 0 {
		return Err(ConfigError::invalid_value("bridge.port", "must not be 0"));
	}
	if config.bridge.connect_timeout.is_zero() {
		return Err(ConfigError::invalid_value(
			"bridge.connect_timeout_secs",
			"must be at least 1",
		));
	}

	let cadence = config.monitor.cadence;
	if !(MIN_CADENCE..=MAX_CADENCE).contains(&cadence) {
		return Err(ConfigError::invalid_value(
			"monitor.cadence_ms",
			format!(
				"{} is outside {}..={}",
				cadence.as_millis(),
				MIN_CADENCE.as_millis(),
				MAX_CADENCE.as_millis()
			),
		));
	}

	let iterations = config.stress.default_iterations;
	if !(i64::from(MIN_ITERATIONS)..=i64::from(MAX_ITERATIONS)).contains(&iterations) {
		return Err(ConfigError::invalid_value(
			"stress.default_iterations",
			format!("{iterations} is outside {MIN_ITERATIONS}..={MAX_ITERATIONS}"),
		));
	}

	if let Some(url) = &config.ai.base_url {
		if !(url.starts_with("http://") || url.starts_with("https://")) {
			return Err(ConfigError::invalid_value(
				"ai.base_url",
				"must start with http:// or https://",
			));
		}
	}

	if config.logging.level.trim().is_empty() {
		return Err(ConfigError::validation("logging.level must not be empty"));
	}

	Ok(())
}
