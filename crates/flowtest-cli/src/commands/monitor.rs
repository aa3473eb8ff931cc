// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use flowtest_common_capabilities::Frame;
use flowtest_workflows::{MonitorSession, SessionPhase};
use tracing::warn;

use crate::bridge::HostLink;
use crate::output;

#[derive(Debug, Clone, clap::Args)]
pub struct MonitorArgs {
	/// Stop after this many seconds. Runs until Ctrl-C otherwise.
	#[arg(long)]
	pub duration_secs: Option<u64>,

	/// Directory that receives every displayed frame
	#[arg(long, short)]
	pub output: Option<PathBuf>,

	/// Leave the target running when monitoring ends
	#[arg(long)]
	pub keep_open: bool,
}

pub async fn run(link: &HostLink, args: MonitorArgs) -> anyhow::Result<()> {
	if let Some(dir) = &args.output {
		std::fs::create_dir_all(dir)?;
	}

	let session = link.monitor_session();
	let target = session.launch().await?;
	output::ok(format!("target launched (pid {})", target.pid.to_string().yellow()));

	session.start_polling()?;
	output::note(format!(
		"polling every {} ms, Ctrl-C to stop",
		session.config().cadence.as_millis()
	));

	let watched = watch_frames(&session, &args).await;
	session.stop_polling();

	if session.phase() == SessionPhase::Idle {
		output::note("target exited");
	} else if !args.keep_open {
		session.close().await?;
		output::ok("target closed");
	}

	output::field("Frames shown", watched?);
	Ok(())
}

async fn watch_frames(session: &MonitorSession, args: &MonitorArgs) -> anyhow::Result<u64> {
	let mut frames = session.subscribe_frames();
	let deadline = async {
		match args.duration_secs {
			Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
			None => std::future::pending().await,
		}
	};
	tokio::pin!(deadline);
	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);
	let mut liveness = tokio::time::interval(Duration::from_secs(1));

	let mut shown = 0u64;
	loop {
		tokio::select! {
			_ = &mut deadline => break,
			_ = &mut ctrl_c => break,
			_ = liveness.tick() => {}
			changed = frames.changed() => {
				if changed.is_err() {
					break;
				}
				let frame = frames.borrow_and_update().clone();
				if let Some(frame) = frame {
					shown += 1;
					report(&frame, args.output.as_ref());
				}
			}
		}
		if session.phase() == SessionPhase::Idle {
			break;
		}
	}
	Ok(shown)
}

fn report(frame: &Frame, output_dir: Option<&PathBuf>) {
	let sequence = frame
		.sequence
		.map_or_else(|| "-".to_string(), |s| s.to_string());
	let mut line = format!(
		"{} #{} {}x{}",
		frame.captured_at.format("%H:%M:%S%.3f").to_string().dimmed(),
		sequence.cyan(),
		frame.width,
		frame.height
	);
	if let Some(dir) = output_dir {
		match output::save_frame(frame, dir) {
			Ok(path) => line.push_str(&format!(" -> {}", path.display())),
			Err(e) => warn!(error = %e, sequence = %sequence, "failed to save frame"),
		}
	}
	println!("{line}");
}
