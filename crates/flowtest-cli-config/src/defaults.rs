// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The commented user config written on first run.

use std::path::Path;

use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# FlowTest configuration.
# Environment variables (FLOWTEST_<SECTION>_<FIELD>) and command-line flags override this file.

[bridge]
host = "127.0.0.1"
port = 4733
# token = "..."
connect_timeout_secs = 10
# 0 waits forever.
call_timeout_secs = 0

[monitor]
cadence_ms = 500
# "discard-stale" or "last-resolved"
frame_ordering = "discard-stale"

[stress]
default_iterations = 10

[ai]
# base_url = "https://..."
require_credential = false

[logging]
level = "info"
"#;

/// Write the template to `path` unless a file is already there.
pub fn ensure_default_config(path: &Path) -> Result<bool, ConfigError> {
	if path.exists() {
		return Ok(false);
	}
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
	info!(path = %path.display(), "wrote default config");
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::runtime::FlowtestConfig;
	use crate::validation::validate;
	use crate::PathsConfig;

	#[test]
	fn test_template_parses_and_validates() {
		let layer: ConfigLayer = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
		let config = FlowtestConfig::from_layer(layer, PathsConfig::default());
		assert!(validate(&config).is_ok());
		assert_eq!(config, FlowtestConfig::default());
	}

	#[test]
	fn test_ensure_creates_once() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("flowtest/config.toml");

		assert!(ensure_default_config(&path).unwrap());
		std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
		assert!(!ensure_default_config(&path).unwrap());
		assert!(std::fs::read_to_string(&path).unwrap().contains("debug"));
	}
}
