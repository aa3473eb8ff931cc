// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use colored::Colorize;
use flowtest_workflows::clamp_iterations;

use crate::bridge::HostLink;
use crate::output;

#[derive(Debug, Clone, clap::Args)]
pub struct StressArgs {
	/// Iterations to run, clamped to 1..=100. Defaults to stress.default_iterations.
	#[arg(long, short = 'n', allow_negative_numbers = true)]
	pub iterations: Option<i64>,

	/// Print each iteration's log line
	#[arg(long)]
	pub logs: bool,

	/// Print the record as JSON
	#[arg(long)]
	pub json: bool,
}

pub async fn run(link: &HostLink, args: StressArgs) -> anyhow::Result<()> {
	let requested = args
		.iterations
		.unwrap_or(link.config().stress.default_iterations);
	let clamped = clamp_iterations(requested);
	if i64::from(clamped) != requested {
		output::note(format!("{requested} iterations is out of range, running {clamped}"));
	}

	let result = link.stress_run().run(requested).await;
	if args.json {
		return output::print_json(result.as_deref());
	}
	let record = result?;

	output::field("Iterations", record.iterations);
	output::field("Successful", record.successful.to_string().green());
	let failed = record.failed.to_string();
	output::field(
		"Failed",
		if record.failed == 0 {
			failed.normal()
		} else {
			failed.red()
		},
	);
	if args.logs {
		println!();
		for line in &record.logs {
			println!("  {}", line.dimmed());
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use flowtest_cli_config::FlowtestConfig;
	use flowtest_common_bridge::testing::ScriptedEndpoint;
	use flowtest_common_bridge::Dispatcher;
	use flowtest_common_capabilities::operations::RUN_STRESS_TEST;
	use flowtest_workflows::WorkflowError;
	use serde_json::{json, Value};
	use std::sync::Arc;

	fn link(endpoint: ScriptedEndpoint) -> HostLink {
		HostLink::with_dispatcher(
			Arc::new(Dispatcher::with_endpoint(Arc::new(endpoint))),
			None,
			FlowtestConfig::default(),
		)
	}

	fn json_args() -> StressArgs {
		StressArgs {
			iterations: Some(5),
			logs: false,
			json: true,
		}
	}

	#[tokio::test]
	async fn rejected_run_renders_failed_envelope() {
		let link = link(ScriptedEndpoint::new().reject(RUN_STRESS_TEST, "host crashed"));

		let result = link.stress_run().run(5).await;
		let err = result.as_ref().unwrap_err().to_string();
		let rendered = output::json_outcome(result.as_deref()).unwrap();
		assert_eq!(
			serde_json::from_str::<Value>(&rendered).unwrap(),
			json!({"success": false, "error": err})
		);
	}

	#[tokio::test]
	async fn json_run_still_fails_the_command() {
		let link = link(ScriptedEndpoint::new().reject(RUN_STRESS_TEST, "host crashed"));

		let err = run(&link, json_args()).await.unwrap_err();
		assert!(matches!(
			err.downcast_ref::<WorkflowError>(),
			Some(WorkflowError::Bridge(_))
		));
	}
}
