// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flowtest_cli_config::CliOverrides;

use crate::commands::ai::AiCommand;
use crate::commands::capture::CaptureArgs;
use crate::commands::monitor::MonitorArgs;
use crate::commands::process::FocusArgs;
use crate::commands::quality::QualityCommand;
use crate::commands::stress::StressArgs;

/// FlowTest - drive and observe a target application through its host bridge
#[derive(Parser, Debug)]
#[command(name = "flowtest", version)]
pub struct Cli {
	/// Bridge host
	#[arg(long, global = true)]
	pub host: Option<String>,

	/// Bridge port
	#[arg(long, global = true)]
	pub port: Option<u16>,

	/// Bridge auth token
	#[arg(long, global = true)]
	pub token: Option<String>,

	/// Per-call timeout in seconds (0 waits forever)
	#[arg(long, global = true)]
	pub call_timeout_secs: Option<u64>,

	/// Monitoring cadence in milliseconds
	#[arg(long, global = true)]
	pub cadence_ms: Option<u64>,

	/// Log filter, e.g. `debug` or `flowtest_workflows=trace`
	#[arg(long, global = true)]
	pub log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	pub log_json: bool,

	#[command(subcommand)]
	pub command: Command,
}

impl Cli {
	pub fn overrides(&self) -> CliOverrides {
		CliOverrides {
			host: self.host.clone(),
			port: self.port,
			token: self.token.clone(),
			call_timeout_secs: self.call_timeout_secs,
			cadence_ms: self.cadence_ms,
			log_level: self.log_level.clone(),
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Check the host is reachable and print its version
	Ping,

	/// Launch the target application
	Launch,

	/// Close the target application
	Close,

	/// Capture one frame and save it
	Capture(CaptureArgs),

	/// List visible windows and those belonging to the target
	Windows,

	/// Bring the target window to the foreground
	Focus(FocusArgs),

	/// Launch the target and watch frames on the configured cadence
	Monitor(MonitorArgs),

	/// Run a batch stress test on the host
	Stress(StressArgs),

	/// AI credential and command operations
	#[command(subcommand)]
	Ai(AiCommand),

	/// Static analysis, unit tests and code metrics
	#[command(subcommand)]
	Quality(QualityCommand),

	/// Interactive console holding one session across commands
	Console,
}

/// Where a frame should be written.
#[derive(Debug, Clone, clap::Args)]
pub struct OutputArgs {
	/// File (for one frame) or directory (for many). Defaults to the frames directory.
	#[arg(long, short)]
	pub output: Option<PathBuf>,
}
