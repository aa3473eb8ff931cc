// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered collection of configuration sources.

use tracing::debug;

use crate::error::ConfigError;
use crate::layer::ConfigLayer;
use crate::paths::PathsConfig;
use crate::runtime::FlowtestConfig;
use crate::sources::ConfigSource;
use crate::validation::validate;

#[derive(Default)]
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		self.sources.push(source);
	}

	/// Merge every source in ascending precedence.
	pub fn merged(&self) -> Result<ConfigLayer, ConfigError> {
		let mut ordered: Vec<&dyn ConfigSource> =
			self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|s| s.precedence());

		let mut merged = ConfigLayer::default();
		for source in ordered {
			debug!(
				source = source.name(),
				precedence = ?source.precedence(),
				"merging config source"
			);
			merged.merge(source.load()?);
		}
		Ok(merged)
	}

	/// Merge, finalize and validate.
	pub fn load(&self, paths: PathsConfig) -> Result<FlowtestConfig, ConfigError> {
		let config = FlowtestConfig::from_layer(self.merged()?, paths);
		validate(&config)?;
		Ok(config)
	}
}
