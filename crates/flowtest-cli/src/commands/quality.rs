// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use clap::Subcommand;
use colored::Colorize;
use flowtest_common_capabilities::{CodeMetrics, StaticAnalysis, UnitTestRun, UnitTestScan};

use crate::bridge::HostLink;
use crate::output;

#[derive(Debug, Subcommand)]
pub enum QualityCommand {
	/// Run static analysis over the target's sources
	Analyze {
		/// Show at most this many issues
		#[arg(long)]
		limit: Option<usize>,

		#[arg(long)]
		json: bool,
	},

	/// List the unit test executables the host can find
	Tests {
		#[arg(long)]
		json: bool,
	},

	/// Run one unit test executable
	Run {
		/// Path as reported by `quality tests`
		test_path: String,

		#[arg(long)]
		json: bool,
	},

	/// Count files and lines in the target's sources
	Metrics {
		#[arg(long)]
		json: bool,
	},
}

pub async fn run(link: &HostLink, command: QualityCommand) -> anyhow::Result<()> {
	let quality = link.quality_workflow();
	match command {
		QualityCommand::Analyze { limit, json } => {
			let analysis = quality.analyze().await;
			if json {
				return output::print_json(analysis.as_deref());
			}
			print_analysis(&*analysis?, limit);
		}
		QualityCommand::Tests { json } => {
			let scan = quality.scan_tests().await;
			if json {
				return output::print_json(scan.as_deref());
			}
			print_scan(&*scan?);
		}
		QualityCommand::Run { test_path, json } => {
			let run = quality.run_test(&test_path).await;
			if json {
				return output::print_json(run.as_deref());
			}
			print_run(&*run?);
		}
		QualityCommand::Metrics { json } => {
			let metrics = quality.metrics().await;
			if json {
				return output::print_json(metrics.as_ref());
			}
			print_metrics(&metrics?);
		}
	}
	Ok(())
}

pub fn print_analysis(analysis: &StaticAnalysis, limit: Option<usize>) {
	output::field("Issues", analysis.total_issues);
	if let Some(root) = &analysis.project_root {
		output::field("Project", root);
	}
	let shown = limit.unwrap_or(analysis.issues.len());
	for issue in analysis.issues.iter().take(shown) {
		let severity = match issue.severity.as_str() {
			"error" => issue.severity.red(),
			"warning" => issue.severity.yellow(),
			_ => issue.severity.normal(),
		};
		println!(
			"  {}:{}:{} {} {} {}",
			issue.file,
			issue.line,
			issue.column,
			severity,
			issue.message,
			format!("[{}]", issue.id).dimmed()
		);
	}
	if analysis.issues.len() > shown {
		output::note(format!("  ... {} more", analysis.issues.len() - shown));
	}
}

pub fn print_scan(scan: &UnitTestScan) {
	output::field("Tests", scan.total_tests);
	for test in &scan.tests {
		println!(
			"  {} {} {}",
			test.name.bold(),
			test.path,
			format!("({})", test.kind).dimmed()
		);
	}
}

pub fn print_run(run: &UnitTestRun) {
	if let Some(path) = &run.test_path {
		output::field("Test", path);
	}
	println!(
		"{} passed, {} failed, {} skipped of {}",
		run.passed.to_string().green(),
		run.failed.to_string().red(),
		run.skipped,
		run.total
	);
	for case in run.cases.iter().filter(|case| !case.passed()) {
		println!("  {} {} {}", "✗".red(), case.name, case.message.dimmed());
	}
}

pub fn print_metrics(metrics: &CodeMetrics) {
	output::field(
		"Files",
		format!(
			"{} ({} source, {} header)",
			metrics.total_files, metrics.cpp_files, metrics.header_files
		),
	);
	output::field("Lines", metrics.total_lines);
	output::field("Code", metrics.code_lines);
	output::field("Comments", metrics.comment_lines);
	output::field("Blank", metrics.blank_lines());
}
