// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files, environment and CLI flags.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ConfigLayer;
use crate::paths::{workspace_config_path, PathsConfig, SYSTEM_CONFIG_FILE};
use crate::sections::{
	AiConfigLayer, BridgeConfigLayer, LoggingConfigLayer, MonitorConfigLayer, StressConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	WorkspaceFile = 40,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is an empty layer.
pub struct FileSource {
	name: &'static str,
	path: PathBuf,
	precedence: Precedence,
}

impl FileSource {
	pub fn new(name: &'static str, path: impl Into<PathBuf>, precedence: Precedence) -> Self {
		Self {
			name,
			path: path.into(),
			precedence,
		}
	}

	pub fn system() -> Self {
		Self::new("system-file", SYSTEM_CONFIG_FILE, Precedence::SystemFile)
	}

	pub fn user(paths: &PathsConfig) -> Self {
		Self::new(
			"user-file",
			paths.user_config_file.clone(),
			Precedence::UserFile,
		)
	}

	pub fn workspace() -> Result<Self, ConfigError> {
		Ok(Self::new(
			"workspace-file",
			workspace_config_path()?,
			Precedence::WorkspaceFile,
		))
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		self.name
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: FLOWTEST_<SECTION>_<FIELD>, plus FLOWTEST_LOG_LEVEL.
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn process() -> Self {
		Self { vars: None }
	}

	/// Read from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|e| ConfigError::invalid_value(name, format!("'{v}': {e}"))),
			None => Ok(None),
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ConfigLayer {
			bridge: Some(BridgeConfigLayer {
				host: self.var("FLOWTEST_BRIDGE_HOST"),
				port: self.parsed("FLOWTEST_BRIDGE_PORT")?,
				token: self.var("FLOWTEST_BRIDGE_TOKEN"),
				connect_timeout_secs: self.parsed("FLOWTEST_BRIDGE_CONNECT_TIMEOUT_SECS")?,
				call_timeout_secs: self.parsed("FLOWTEST_BRIDGE_CALL_TIMEOUT_SECS")?,
			}),
			monitor: Some(MonitorConfigLayer {
				cadence_ms: self.parsed("FLOWTEST_MONITOR_CADENCE_MS")?,
				frame_ordering: self.parsed("FLOWTEST_MONITOR_FRAME_ORDERING")?,
			}),
			stress: Some(StressConfigLayer {
				default_iterations: self.parsed("FLOWTEST_STRESS_DEFAULT_ITERATIONS")?,
			}),
			ai: Some(AiConfigLayer {
				base_url: self.var("FLOWTEST_AI_BASE_URL"),
				require_credential: self.bool("FLOWTEST_AI_REQUIRE_CREDENTIAL"),
			}),
			logging: Some(LoggingConfigLayer {
				level: self.var("FLOWTEST_LOG_LEVEL"),
			}),
		})
	}
}

/// Values given as command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub token: Option<String>,
	pub call_timeout_secs: Option<u64>,
	pub cadence_ms: Option<u64>,
	pub log_level: Option<String>,
}

pub struct CliSource {
	overrides: CliOverrides,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let cli = self.overrides.clone();
		Ok(ConfigLayer {
			bridge: Some(BridgeConfigLayer {
				host: cli.host,
				port: cli.port,
				token: cli.token,
				connect_timeout_secs: None,
				call_timeout_secs: cli.call_timeout_secs,
			}),
			monitor: Some(MonitorConfigLayer {
				cadence_ms: cli.cadence_ms,
				frame_ordering: None,
			}),
			logging: Some(LoggingConfigLayer {
				level: cli.log_level,
			}),
			..Default::default()
		})
	}
}
