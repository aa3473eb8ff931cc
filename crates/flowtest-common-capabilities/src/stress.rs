// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use flowtest_common_bridge::{BridgeResult, ContractViolation, Dispatcher, Outcome, ResultShape};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::operations::RUN_STRESS_TEST;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StressFields {
	#[serde(default)]
	pub total_iterations: Option<u32>,
	#[serde(default)]
	pub successful: Option<u32>,
	#[serde(default)]
	pub failed: Option<u32>,
	#[serde(default)]
	pub logs: Option<Vec<String>>,
}

/// Aggregated stress-run counts as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressReport {
	pub total_iterations: Option<u32>,
	pub successful: u32,
	pub failed: u32,
	pub logs: Vec<String>,
}

impl ResultShape for StressFields {
	type Value = StressReport;

	fn into_value(self) -> Result<StressReport, ContractViolation> {
		Ok(StressReport {
			total_iterations: self.total_iterations,
			successful: self
				.successful
				.ok_or_else(|| ContractViolation::missing("successful"))?,
			failed: self.failed.ok_or_else(|| ContractViolation::missing("failed"))?,
			logs: self.logs.unwrap_or_default(),
		})
	}
}

/// A completed stress run. `successful + failed == iterations` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StressRecord {
	pub iterations: u32,
	pub successful: u32,
	pub failed: u32,
	pub logs: Vec<String>,
}

impl StressReport {
	/// Check the report against the iteration count that was submitted.
	pub fn into_record(self, submitted: u32) -> Result<StressRecord, ContractViolation> {
		let iterations = self.total_iterations.unwrap_or(submitted);
		if iterations != submitted {
			return Err(ContractViolation(format!(
				"host ran {iterations} iterations but {submitted} were submitted"
			)));
		}
		if self.successful.checked_add(self.failed) != Some(iterations) {
			return Err(ContractViolation(format!(
				"successful ({}) + failed ({}) != iterations ({iterations})",
				self.successful, self.failed
			)));
		}
		Ok(StressRecord {
			iterations,
			successful: self.successful,
			failed: self.failed,
			logs: self.logs,
		})
	}
}

#[derive(Clone)]
pub struct StressTesting {
	dispatcher: Arc<Dispatcher>,
}

impl StressTesting {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	/// Submit a batch of `iterations`; the caller is responsible for clamping.
	pub async fn run(&self, iterations: u32) -> BridgeResult<Outcome<StressReport>> {
		self
			.dispatcher
			.invoke_envelope::<StressFields>(RUN_STRESS_TEST, vec![json!(iterations)])
			.await
	}
}
