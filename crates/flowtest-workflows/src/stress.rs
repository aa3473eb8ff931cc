// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use flowtest_common_bridge::BridgeError;
use flowtest_common_capabilities::operations::RUN_STRESS_TEST;
use flowtest_common_capabilities::{StressRecord, StressTesting};
use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::error::{succeeded, WorkflowResult};
use crate::guard::InFlight;

pub const MIN_ITERATIONS: u32 = 1;
pub const MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_ITERATIONS: u32 = 10;

/// Clamp a requested iteration count into `MIN_ITERATIONS..=MAX_ITERATIONS`.
pub fn clamp_iterations(requested: i64) -> u32 {
	requested.clamp(i64::from(MIN_ITERATIONS), i64::from(MAX_ITERATIONS)) as u32
}

/// One-shot batch stress test. A second run while one is outstanding is refused.
pub struct StressRun {
	stress: StressTesting,
	in_flight: InFlight,
	last: Mutex<Option<Arc<StressRecord>>>,
}

impl StressRun {
	pub fn new(stress: StressTesting) -> Self {
		Self {
			stress,
			in_flight: InFlight::default(),
			last: Mutex::new(None),
		}
	}

	pub fn is_running(&self) -> bool {
		self.in_flight.is_busy()
	}

	/// The most recent successful record.
	pub fn last_record(&self) -> Option<Arc<StressRecord>> {
		self.last.lock().clone()
	}

	#[instrument(skip(self))]
	pub async fn run(&self, requested: i64) -> WorkflowResult<Arc<StressRecord>> {
		let _guard = self.in_flight.try_begin("stress test")?;
		let iterations = clamp_iterations(requested);

		let (report, _) = succeeded(self.stress.run(iterations).await?)?;
		let record = report
			.into_record(iterations)
			.map_err(|violation| BridgeError::invalid_result(RUN_STRESS_TEST, violation.0))?;
		let record = Arc::new(record);
		*self.last.lock() = Some(Arc::clone(&record));

		info!(
			iterations,
			successful = record.successful,
			failed = record.failed,
			"stress test finished"
		);
		Ok(record)
	}
}
