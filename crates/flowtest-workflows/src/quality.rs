// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use flowtest_common_capabilities::{
	CodeMetrics, QualityChecks, StaticAnalysis, UnitTestRun, UnitTestScan,
};
use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::error::{succeeded, WorkflowError, WorkflowResult};
use crate::guard::InFlight;

const ACTIVITY: &str = "quality check";

#[derive(Default)]
struct Latest {
	analysis: Option<Arc<StaticAnalysis>>,
	scan: Option<Arc<UnitTestScan>>,
	run: Option<Arc<UnitTestRun>>,
	metrics: Option<CodeMetrics>,
}

/// Static analysis, unit tests and code metrics, one check at a time.
pub struct QualityWorkflow {
	checks: QualityChecks,
	in_flight: InFlight,
	latest: Mutex<Latest>,
}

impl QualityWorkflow {
	pub fn new(checks: QualityChecks) -> Self {
		Self {
			checks,
			in_flight: InFlight::default(),
			latest: Mutex::new(Latest::default()),
		}
	}

	pub fn is_running(&self) -> bool {
		self.in_flight.is_busy()
	}

	pub fn last_analysis(&self) -> Option<Arc<StaticAnalysis>> {
		self.latest.lock().analysis.clone()
	}

	pub fn last_scan(&self) -> Option<Arc<UnitTestScan>> {
		self.latest.lock().scan.clone()
	}

	pub fn last_run(&self) -> Option<Arc<UnitTestRun>> {
		self.latest.lock().run.clone()
	}

	pub fn last_metrics(&self) -> Option<CodeMetrics> {
		self.latest.lock().metrics
	}

	#[instrument(skip(self))]
	pub async fn analyze(&self) -> WorkflowResult<Arc<StaticAnalysis>> {
		let _guard = self.in_flight.try_begin(ACTIVITY)?;
		let (analysis, _) = succeeded(self.checks.static_analysis().await?)?;
		let analysis = Arc::new(analysis);
		self.latest.lock().analysis = Some(Arc::clone(&analysis));
		info!(total_issues = analysis.total_issues, "static analysis finished");
		Ok(analysis)
	}

	#[instrument(skip(self))]
	pub async fn scan_tests(&self) -> WorkflowResult<Arc<UnitTestScan>> {
		let _guard = self.in_flight.try_begin(ACTIVITY)?;
		let (scan, _) = succeeded(self.checks.scan_unit_tests().await?)?;
		let scan = Arc::new(scan);
		self.latest.lock().scan = Some(Arc::clone(&scan));
		info!(total_tests = scan.total_tests, "unit test scan finished");
		Ok(scan)
	}

	#[instrument(skip(self))]
	pub async fn run_test(&self, test_path: &str) -> WorkflowResult<Arc<UnitTestRun>> {
		let test_path = test_path.trim();
		if test_path.is_empty() {
			return Err(WorkflowError::validation("test path must not be empty"));
		}
		let _guard = self.in_flight.try_begin(ACTIVITY)?;
		let (run, _) = succeeded(self.checks.run_unit_test(test_path).await?)?;
		let run = Arc::new(run);
		self.latest.lock().run = Some(Arc::clone(&run));
		info!(passed = run.passed, total = run.total, "unit test finished");
		Ok(run)
	}

	#[instrument(skip(self))]
	pub async fn metrics(&self) -> WorkflowResult<CodeMetrics> {
		let _guard = self.in_flight.try_begin(ACTIVITY)?;
		let (metrics, _) = succeeded(self.checks.code_metrics().await?)?;
		self.latest.lock().metrics = Some(metrics);
		info!(
			total_files = metrics.total_files,
			total_lines = metrics.total_lines,
			"code metrics collected"
		);
		Ok(metrics)
	}
}
