// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the FlowTest CLI.
//!
//! This crate provides:
//! - XDG Base Directory compliant path resolution
//! - Layered configuration from multiple sources
//! - TOML configuration file parsing
//! - Environment variable overrides
//! - Configuration validation

pub mod defaults;
pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod sections;
pub mod sources;
pub mod validation;

pub use defaults::{ensure_default_config, DEFAULT_CONFIG_TEMPLATE};
pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::FlowtestConfig;
pub use sources::{CliOverrides, ConfigSource, Precedence};

/// Load configuration from all sources, with CLI flags on top.
///
/// If no user config file exists, a default one is created at
/// `~/.config/flowtest/config.toml`. Failing to create it is not fatal.
pub fn load_config_with_cli(cli: CliOverrides) -> Result<FlowtestConfig, ConfigError> {
	let paths = paths::resolve_xdg_paths()?;

	if let Err(e) = defaults::ensure_default_config(&paths.user_config_file) {
		tracing::warn!(error = %e, "could not write default config");
	}

	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::system()));
	registry.register(Box::new(sources::FileSource::user(&paths)));
	if let Ok(ws) = sources::FileSource::workspace() {
		registry.register(Box::new(ws));
	}
	registry.register(Box::new(sources::EnvSource::process()));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load(paths)
}
