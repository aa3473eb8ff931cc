// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A partial configuration produced by one source.

use serde::{Deserialize, Serialize};

use crate::sections::{
	AiConfigLayer, BridgeConfigLayer, LoggingConfigLayer, MonitorConfigLayer, StressConfigLayer,
};

/// Every field is optional so that higher-precedence layers only override
/// what they actually set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
	pub bridge: Option<BridgeConfigLayer>,
	pub monitor: Option<MonitorConfigLayer>,
	pub stress: Option<StressConfigLayer>,
	pub ai: Option<AiConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	let Some(other) = other else {
		return;
	};
	match base {
		Some(existing) => merge(existing, other),
		None => *base = Some(other),
	}
}

impl ConfigLayer {
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_section(&mut self.bridge, other.bridge, BridgeConfigLayer::merge);
		merge_section(&mut self.monitor, other.monitor, MonitorConfigLayer::merge);
		merge_section(&mut self.stress, other.stress, StressConfigLayer::merge);
		merge_section(&mut self.ai, other.ai, AiConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_parses_full_file() {
		let layer: ConfigLayer = toml::from_str(
			r#"
[bridge]
host = "192.168.1.20"
port = 4800
token = "abc"
call_timeout_secs = 30

[monitor]
cadence_ms = 1000
frame_ordering = "discard-stale"

[stress]
default_iterations = 25

[ai]
base_url = "https://llm.example/v1"
require_credential = true

[logging]
level = "debug"
"#,
		)
		.unwrap();
		assert_eq!(layer.bridge.as_ref().and_then(|b| b.port), Some(4800));
		assert_eq!(layer.stress.and_then(|s| s.default_iterations), Some(25));
		assert_eq!(layer.ai.and_then(|a| a.require_credential), Some(true));
	}

	#[test]
	fn test_unknown_section_is_rejected() {
		assert!(toml::from_str::<ConfigLayer>("[daemon]\nport = 1").is_err());
	}

	#[test]
	fn test_merge_keeps_lower_section_when_upper_is_absent() {
		let mut base: ConfigLayer = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
		base.merge(toml::from_str("[bridge]\nport = 9000").unwrap());
		assert_eq!(
			base.logging.and_then(|l| l.level).as_deref(),
			Some("warn")
		);
		assert_eq!(base.bridge.and_then(|b| b.port), Some(9000));
	}

	proptest! {
		#[test]
		fn merge_prefers_the_upper_layer_when_set(lower in proptest::option::of(1u16..), upper in proptest::option::of(1u16..)) {
			let mut base = ConfigLayer {
				bridge: Some(BridgeConfigLayer { port: lower, ..Default::default() }),
				..Default::default()
			};
			base.merge(ConfigLayer {
				bridge: Some(BridgeConfigLayer { port: upper, ..Default::default() }),
				..Default::default()
			});
			prop_assert_eq!(base.bridge.and_then(|b| b.port), upper.or(lower));
		}
	}
}
