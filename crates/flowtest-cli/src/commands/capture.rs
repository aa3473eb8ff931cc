// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use flowtest_workflows::succeeded;

use crate::args::OutputArgs;
use crate::bridge::HostLink;
use crate::output;

#[derive(Debug, Clone, clap::Args)]
pub struct CaptureArgs {
	#[command(flatten)]
	pub output: OutputArgs,
}

pub async fn run(link: &HostLink, args: CaptureArgs) -> anyhow::Result<()> {
	let (frame, _) = succeeded(link.capabilities().capture().frame().await?)?;

	let target = match args.output.output {
		Some(path) => path,
		None => {
			let dir = link.config().paths.frames_dir.clone();
			std::fs::create_dir_all(&dir)?;
			dir
		}
	};
	let path = output::save_frame(&frame, &target)?;

	output::ok(format!(
		"{}x{} frame saved to {}",
		frame.width,
		frame.height,
		path.display()
	));
	Ok(())
}
