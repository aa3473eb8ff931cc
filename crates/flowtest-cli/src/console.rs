// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interactive console.
//!
//! Unlike one-shot subcommands, the console keeps a single monitoring
//! session and one instance of each workflow alive between commands, so
//! polling runs in the background while other commands are issued.

use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use flowtest_common_bridge::SecretString;
use flowtest_common_capabilities::VisualPattern;
use flowtest_workflows::{
	succeeded, AiWorkflow, MonitorSession, QualityWorkflow, SessionPhase, StressRun,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::bridge::HostLink;
use crate::commands::{ai, quality};
use crate::output;

const HELP: &str = "\
commands:
  launch | close                 start or close the target application
  poll start | poll stop         control the capture cadence
  capture [path]                 capture one frame now, optionally saving it
  save <path>                    save the last displayed frame
  status                         session phase, target and last frame
  windows | focus [title]        window introspection
  stress [iterations]            batch stress test
  key <api-key> [base-url]       provision the AI credential
  ai <command...>                run a free-text AI command
  verify <line|rectangle|circle> check the current frame for a shape
  analyze | tests | run <path> | metrics
  ping | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
	Help,
	Quit,
	Ping,
	Status,
	Launch,
	Close,
	StartPolling,
	StopPolling,
	Capture(Option<PathBuf>),
	Save(PathBuf),
	Windows,
	Focus(Option<String>),
	Stress(Option<i64>),
	Key {
		key: SecretString,
		base_url: Option<String>,
	},
	Ai(String),
	Verify(VisualPattern),
	Analyze,
	Tests,
	RunTest(String),
	Metrics,
}

impl ConsoleCommand {
	/// Parse one console line. Blank lines parse to `None`.
	pub fn parse(line: &str) -> Result<Option<Self>, String> {
		let line = line.trim();
		let (word, rest) = match line.split_once(char::is_whitespace) {
			Some((word, rest)) => (word, rest.trim()),
			None => (line, ""),
		};
		let rest_opt = || (!rest.is_empty()).then(|| rest.to_string());

		let command = match word.to_ascii_lowercase().as_str() {
			"" => return Ok(None),
			"help" | "?" => Self::Help,
			"quit" | "exit" | "q" => Self::Quit,
			"ping" => Self::Ping,
			"status" => Self::Status,
			"launch" => Self::Launch,
			"close" => Self::Close,
			"poll" => match rest {
				"start" | "on" => Self::StartPolling,
				"stop" | "off" => Self::StopPolling,
				_ => return Err("usage: poll start|stop".to_string()),
			},
			"capture" => Self::Capture(rest_opt().map(PathBuf::from)),
			"save" => Self::Save(
				rest_opt()
					.map(PathBuf::from)
					.ok_or_else(|| "usage: save <path>".to_string())?,
			),
			"windows" => Self::Windows,
			"focus" => Self::Focus(rest_opt()),
			"stress" => Self::Stress(
				rest_opt()
					.map(|n| {
						n.parse::<i64>()
							.map_err(|_| format!("not a number: {n}"))
					})
					.transpose()?,
			),
			"key" => {
				let mut parts = rest.split_whitespace();
				let key = parts
					.next()
					.ok_or_else(|| "usage: key <api-key> [base-url]".to_string())?;
				Self::Key {
					key: SecretString::from(key),
					base_url: parts.next().map(str::to_string),
				}
			}
			// Blank commands are passed through; the workflow rejects them without a host call.
			"ai" => Self::Ai(rest.to_string()),
			"verify" => Self::Verify(rest.parse()?),
			"analyze" => Self::Analyze,
			"tests" => Self::Tests,
			"run" => Self::RunTest(rest.to_string()),
			"metrics" => Self::Metrics,
			other => return Err(format!("unknown command `{other}`, try `help`")),
		};
		Ok(Some(command))
	}
}

pub struct Console<'a> {
	link: &'a HostLink,
	session: MonitorSession,
	stress: StressRun,
	ai: AiWorkflow,
	quality: QualityWorkflow,
}

impl<'a> Console<'a> {
	pub fn new(link: &'a HostLink) -> Self {
		Self {
			link,
			session: link.monitor_session(),
			stress: link.stress_run(),
			ai: link.ai_workflow(),
			quality: link.quality_workflow(),
		}
	}

	pub fn session(&self) -> &MonitorSession {
		&self.session
	}

	/// Run one command. Returns `false` when the console should exit.
	pub async fn execute(&self, command: ConsoleCommand) -> anyhow::Result<bool> {
		debug!(?command, "console command");
		match command {
			ConsoleCommand::Help => println!("{HELP}"),
			ConsoleCommand::Quit => return Ok(false),
			ConsoleCommand::Ping => {
				let reply = self.link.capabilities().host().ping().await?;
				output::ok(reply);
			}
			ConsoleCommand::Status => self.print_status(),
			ConsoleCommand::Launch => {
				let target = self.session.launch().await?;
				output::ok(format!("target launched (pid {})", target.pid));
			}
			ConsoleCommand::Close => {
				self.session.close().await?;
				output::ok("target closed");
			}
			ConsoleCommand::StartPolling => {
				self.session.start_polling()?;
				output::ok("polling");
			}
			ConsoleCommand::StopPolling => {
				if self.session.stop_polling() {
					output::ok("polling stopped");
				} else {
					output::note("not polling");
				}
			}
			ConsoleCommand::Capture(path) => {
				let frame = self.session.capture_once().await?;
				output::ok(format!("{}x{} frame captured", frame.width, frame.height));
				if let Some(path) = path {
					let written = output::save_frame(&frame, &path)?;
					output::field("Saved", written.display());
				}
			}
			ConsoleCommand::Save(path) => match self.session.last_frame() {
				Some(frame) => {
					let written = output::save_frame(&frame, &path)?;
					output::ok(format!("saved {}", written.display()));
				}
				None => output::note("no frame yet"),
			},
			ConsoleCommand::Windows => {
				let (info, _) =
					succeeded(self.link.capabilities().process().window_info().await?)?;
				for title in &info.target_windows {
					println!("  {}", title.green());
				}
				output::field("Windows", info.all_windows.len());
			}
			ConsoleCommand::Focus(title) => {
				let (focused, _) = succeeded(
					self
						.link
						.capabilities()
						.process()
						.focus_window(title.as_deref())
						.await?,
				)?;
				output::ok(format!(
					"focused {}",
					focused.window_title.as_deref().unwrap_or("target window")
				));
			}
			ConsoleCommand::Stress(iterations) => {
				let requested =
					iterations.unwrap_or(self.link.config().stress.default_iterations);
				let record = self.stress.run(requested).await?;
				output::ok(format!(
					"{} iterations: {} successful, {} failed",
					record.iterations, record.successful, record.failed
				));
			}
			ConsoleCommand::Key { key, base_url } => {
				let message = self.ai.provision(key, base_url.as_deref()).await?;
				output::ok(message.unwrap_or_else(|| "API key set".to_string()));
			}
			ConsoleCommand::Ai(command) => {
				let exchange = self.ai.execute(&command).await?;
				ai::print_exchange(&exchange);
			}
			ConsoleCommand::Verify(pattern) => {
				let verification = self.ai.verify(pattern).await?;
				ai::print_verification(&verification);
			}
			ConsoleCommand::Analyze => {
				let analysis = self.quality.analyze().await?;
				quality::print_analysis(&analysis, Some(20));
			}
			ConsoleCommand::Tests => quality::print_scan(&*self.quality.scan_tests().await?),
			ConsoleCommand::RunTest(path) => quality::print_run(&*self.quality.run_test(&path).await?),
			ConsoleCommand::Metrics => quality::print_metrics(&self.quality.metrics().await?),
		}
		Ok(true)
	}

	fn print_status(&self) {
		let phase = match self.session.phase() {
			SessionPhase::Idle => "idle".normal(),
			SessionPhase::Ready => "ready".yellow(),
			SessionPhase::Polling => "polling".green(),
		};
		output::field("Phase", phase);
		output::field(
			"Host",
			if self.link.is_connected() {
				"connected".green()
			} else {
				"not connected".red()
			},
		);
		if let Some(target) = self.session.target() {
			output::field("Target", format!("pid {}", target.pid));
		}
		if let Some(frame) = self.session.last_frame() {
			output::field(
				"Last frame",
				format!(
					"#{} {}x{} at {}",
					frame.sequence.unwrap_or_default(),
					frame.width,
					frame.height,
					frame.captured_at.format("%H:%M:%S%.3f")
				),
			);
		}
		if let Some(record) = self.stress.last_record() {
			output::field(
				"Last stress",
				format!("{}/{} successful", record.successful, record.iterations),
			);
		}
		output::field("AI key", output::yes_no(self.ai.is_provisioned()));
	}

	/// Stop polling and close a target this console is still holding.
	pub async fn shutdown(&self) {
		self.session.stop_polling();
		if self.session.phase() != SessionPhase::Idle {
			if let Err(e) = self.session.close().await {
				output::failure(&e);
			}
		}
	}
}

pub async fn run(link: &HostLink) -> anyhow::Result<()> {
	let console = Console::new(link);
	println!("{} (type `help` for commands)", "flowtest console".bold());
	if !link.is_connected() {
		output::note("host not connected; remote commands will fail");
	}

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	loop {
		print!("{} ", "flowtest>".cyan());
		std::io::stdout().flush()?;

		let Some(line) = lines.next_line().await? else {
			break;
		};
		match ConsoleCommand::parse(&line) {
			Ok(None) => {}
			Ok(Some(command)) => match console.execute(command).await {
				Ok(true) => {}
				Ok(false) => break,
				Err(e) => output::error(&e),
			},
			Err(usage) => eprintln!("{}", usage.red()),
		}
	}

	console.shutdown().await;
	Ok(())
}
