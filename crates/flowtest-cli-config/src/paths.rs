// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

pub const SYSTEM_CONFIG_FILE: &str = "/etc/flowtest/config.toml";
pub const WORKSPACE_CONFIG_FILE: &str = ".flowtest/config.toml";

/// Resolved XDG paths for FlowTest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// User config file: ~/.config/flowtest/config.toml
	pub user_config_file: PathBuf,
	/// System config file: /etc/flowtest/config.toml
	pub system_config_file: PathBuf,
	/// Captured frames land here unless a command names another directory: ~/.local/share/flowtest/frames
	pub frames_dir: PathBuf,
}

impl PathsConfig {
	/// Get the config directory (parent of user_config_file)
	pub fn config_dir(&self) -> PathBuf {
		self
			.user_config_file
			.parent()
			.map(|p| p.to_path_buf())
			.unwrap_or_else(|| self.user_config_file.clone())
	}
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			user_config_file: PathBuf::from("~/.config/flowtest/config.toml"),
			system_config_file: PathBuf::from(SYSTEM_CONFIG_FILE),
			frames_dir: PathBuf::from("~/.local/share/flowtest/frames"),
		}
	}
}

/// Resolve XDG paths, honouring XDG_CONFIG_HOME and XDG_DATA_HOME.
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;

	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".config"));

	let data_home = std::env::var_os("XDG_DATA_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/share"));

	tracing::debug!(
		config_home = %config_home.display(),
		data_home = %data_home.display(),
		"resolved XDG paths"
	);

	Ok(PathsConfig {
		user_config_file: config_home.join("flowtest/config.toml"),
		system_config_file: PathBuf::from(SYSTEM_CONFIG_FILE),
		frames_dir: data_home.join("flowtest/frames"),
	})
}

/// Get the workspace config file path from current directory.
pub fn workspace_config_path() -> Result<PathBuf, ConfigError> {
	let cwd = std::env::current_dir()?;
	Ok(cwd.join(WORKSPACE_CONFIG_FILE))
}
