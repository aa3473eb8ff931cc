// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Static analysis, unit tests and code metrics of the project under test.

use std::sync::Arc;

use flowtest_common_bridge::{BridgeResult, ContractViolation, Dispatcher, Outcome, ResultShape};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::operations::{GET_CODE_METRICS, RUN_STATIC_ANALYSIS, RUN_UNIT_TEST, SCAN_UNIT_TESTS};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticIssue {
	pub id: String,
	pub severity: String,
	pub message: String,
	#[serde(default)]
	pub verbose: String,
	pub file: String,
	pub line: u32,
	pub column: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaticAnalysisFields {
	#[serde(default)]
	pub total_issues: Option<u32>,
	#[serde(default)]
	pub issues: Option<Vec<StaticIssue>>,
	#[serde(default)]
	pub project_root: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticAnalysis {
	pub total_issues: u32,
	pub issues: Vec<StaticIssue>,
	pub project_root: Option<String>,
}

impl ResultShape for StaticAnalysisFields {
	type Value = StaticAnalysis;

	fn into_value(self) -> Result<StaticAnalysis, ContractViolation> {
		Ok(StaticAnalysis {
			total_issues: self
				.total_issues
				.ok_or_else(|| ContractViolation::missing("total_issues"))?,
			issues: self.issues.unwrap_or_default(),
			project_root: self.project_root,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnitTest {
	pub name: String,
	pub path: String,
	#[serde(rename = "type")]
	pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UnitTestScanFields {
	#[serde(default)]
	pub total_tests: Option<u32>,
	#[serde(default)]
	pub tests: Option<Vec<UnitTest>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitTestScan {
	pub total_tests: u32,
	pub tests: Vec<UnitTest>,
}

impl ResultShape for UnitTestScanFields {
	type Value = UnitTestScan;

	fn into_value(self) -> Result<UnitTestScan, ContractViolation> {
		let tests = self.tests.unwrap_or_default();
		Ok(UnitTestScan {
			total_tests: self.total_tests.unwrap_or(tests.len() as u32),
			tests,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestCase {
	pub name: String,
	pub status: String,
	#[serde(default)]
	pub message: String,
}

impl TestCase {
	pub fn passed(&self) -> bool {
		self.status == "passed"
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UnitTestRunFields {
	#[serde(default)]
	pub test_path: Option<String>,
	#[serde(default)]
	pub total: Option<u32>,
	#[serde(default)]
	pub passed: Option<u32>,
	#[serde(default)]
	pub failed: Option<u32>,
	#[serde(default)]
	pub skipped: Option<u32>,
	#[serde(default)]
	pub cases: Option<Vec<TestCase>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitTestRun {
	pub test_path: Option<String>,
	pub total: u32,
	pub passed: u32,
	pub failed: u32,
	pub skipped: u32,
	pub cases: Vec<TestCase>,
}

impl ResultShape for UnitTestRunFields {
	type Value = UnitTestRun;

	fn into_value(self) -> Result<UnitTestRun, ContractViolation> {
		Ok(UnitTestRun {
			test_path: self.test_path,
			total: self.total.ok_or_else(|| ContractViolation::missing("total"))?,
			passed: self.passed.ok_or_else(|| ContractViolation::missing("passed"))?,
			failed: self.failed.ok_or_else(|| ContractViolation::missing("failed"))?,
			skipped: self.skipped.unwrap_or_default(),
			cases: self.cases.unwrap_or_default(),
		})
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CodeMetricsFields {
	#[serde(default)]
	pub total_files: Option<u32>,
	#[serde(default)]
	pub total_lines: Option<u64>,
	#[serde(default)]
	pub cpp_files: Option<u32>,
	#[serde(default)]
	pub header_files: Option<u32>,
	#[serde(default)]
	pub code_lines: Option<u64>,
	#[serde(default)]
	pub comment_lines: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeMetrics {
	pub total_files: u32,
	pub total_lines: u64,
	pub cpp_files: u32,
	pub header_files: u32,
	pub code_lines: u64,
	pub comment_lines: u64,
}

impl CodeMetrics {
	/// Lines that are neither code nor comments.
	pub fn blank_lines(&self) -> u64 {
		self
			.total_lines
			.saturating_sub(self.code_lines + self.comment_lines)
	}
}

impl ResultShape for CodeMetricsFields {
	type Value = CodeMetrics;

	fn into_value(self) -> Result<CodeMetrics, ContractViolation> {
		Ok(CodeMetrics {
			total_files: self
				.total_files
				.ok_or_else(|| ContractViolation::missing("total_files"))?,
			total_lines: self
				.total_lines
				.ok_or_else(|| ContractViolation::missing("total_lines"))?,
			cpp_files: self.cpp_files.unwrap_or_default(),
			header_files: self.header_files.unwrap_or_default(),
			code_lines: self.code_lines.unwrap_or_default(),
			comment_lines: self.comment_lines.unwrap_or_default(),
		})
	}
}

#[derive(Clone)]
pub struct QualityChecks {
	dispatcher: Arc<Dispatcher>,
}

impl QualityChecks {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub async fn static_analysis(&self) -> BridgeResult<Outcome<StaticAnalysis>> {
		self
			.dispatcher
			.invoke_envelope::<StaticAnalysisFields>(RUN_STATIC_ANALYSIS, vec![])
			.await
	}

	pub async fn scan_unit_tests(&self) -> BridgeResult<Outcome<UnitTestScan>> {
		self
			.dispatcher
			.invoke_envelope::<UnitTestScanFields>(SCAN_UNIT_TESTS, vec![])
			.await
	}

	pub async fn run_unit_test(&self, test_path: &str) -> BridgeResult<Outcome<UnitTestRun>> {
		self
			.dispatcher
			.invoke_envelope::<UnitTestRunFields>(RUN_UNIT_TEST, vec![json!(test_path)])
			.await
	}

	pub async fn code_metrics(&self) -> BridgeResult<Outcome<CodeMetrics>> {
		self
			.dispatcher
			.invoke_envelope::<CodeMetricsFields>(GET_CODE_METRICS, vec![])
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flowtest_common_bridge::testing::ScriptedEndpoint;
	use tokio_test::assert_ok;

	fn checks(endpoint: ScriptedEndpoint) -> QualityChecks {
		QualityChecks::new(Arc::new(Dispatcher::with_endpoint(Arc::new(endpoint))))
	}

	#[tokio::test]
	async fn static_analysis_parses_issues() {
		let checks = checks(ScriptedEndpoint::new().respond(
			RUN_STATIC_ANALYSIS,
			json!({
				"success": true,
				"total_issues": 1,
				"issues": [{
					"id": "nullPointer", "severity": "error", "message": "Null pointer dereference",
					"verbose": "", "file": "mygraphicsview.cpp", "line": 42, "column": 7
				}],
				"project_root": "/src/diagramscene"
			}),
		));

		let analysis = assert_ok!(assert_ok!(checks.static_analysis().await).into_result());
		assert_eq!(analysis.total_issues, 1);
		assert_eq!(analysis.issues[0].file, "mygraphicsview.cpp");
		assert_eq!(analysis.issues[0].line, 42);
	}

	#[tokio::test]
	async fn scan_reads_test_kind_from_type_field() {
		let checks = checks(ScriptedEndpoint::new().respond(
			SCAN_UNIT_TESTS,
			json!({"success": true, "tests": [{"name": "tst_scene", "path": "build/tst_scene.exe", "type": "QTest"}]}),
		));

		let scan = assert_ok!(assert_ok!(checks.scan_unit_tests().await).into_result());
		assert_eq!(scan.total_tests, 1);
		assert_eq!(scan.tests[0].kind, "QTest");
	}

	#[tokio::test]
	async fn unit_test_run_counts_cases() {
		let checks = checks(ScriptedEndpoint::new().respond(
			RUN_UNIT_TEST,
			json!({
				"success": true, "test_path": "tst_scene.exe", "total": 2, "passed": 1, "failed": 1,
				"skipped": 0,
				"cases": [
					{"name": "initTestCase", "status": "passed", "message": ""},
					{"name": "testDrag", "status": "failed", "message": "Compared values are not the same"}
				]
			}),
		));

		let run = assert_ok!(assert_ok!(checks.run_unit_test("tst_scene.exe").await).into_result());
		assert_eq!(run.cases.iter().filter(|c| c.passed()).count(), 1);
		assert_eq!(run.failed, 1);
	}

	#[test]
	fn blank_lines_never_underflow() {
		let metrics = CodeMetrics {
			total_files: 1,
			total_lines: 10,
			cpp_files: 1,
			header_files: 0,
			code_lines: 8,
			comment_lines: 5,
		};
		assert_eq!(metrics.blank_lines(), 0);
	}
}
