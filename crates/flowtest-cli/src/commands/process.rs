// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use colored::Colorize;
use flowtest_workflows::succeeded;

use crate::bridge::HostLink;
use crate::output;

#[derive(Debug, Clone, clap::Args)]
pub struct FocusArgs {
	/// Window title to focus. Defaults to the target's main window.
	#[arg(long)]
	pub title: Option<String>,
}

pub async fn launch(link: &HostLink) -> anyhow::Result<()> {
	let session = link.monitor_session();
	let target = session.launch().await?;

	output::ok(format!("target launched (pid {})", target.pid.to_string().yellow()));
	if let Some(path) = &target.path {
		output::field("Path", path);
	}
	Ok(())
}

pub async fn close(link: &HostLink) -> anyhow::Result<()> {
	link.monitor_session().close().await?;
	output::ok("target closed");
	Ok(())
}

pub async fn windows(link: &HostLink) -> anyhow::Result<()> {
	let (info, _) = succeeded(link.capabilities().process().window_info().await?)?;

	println!("{} ({})", "Target windows".bold(), info.target_windows.len());
	if info.target_windows.is_empty() {
		output::note("  (none)");
	}
	for title in &info.target_windows {
		println!("  {}", title.green());
	}

	println!();
	println!("{} ({})", "All windows".bold(), info.all_windows.len());
	for title in &info.all_windows {
		println!("  {title}");
	}
	Ok(())
}

pub async fn focus(link: &HostLink, args: FocusArgs) -> anyhow::Result<()> {
	let (focused, message) = succeeded(
		link
			.capabilities()
			.process()
			.focus_window(args.title.as_deref())
			.await?,
	)?;

	output::ok(message.unwrap_or_else(|| "window focused".to_string()));
	if let Some(title) = focused.window_title {
		output::field("Window", title);
	}
	if let Some(pos) = focused.position {
		output::field(
			"Position",
			format!("{}x{} at ({}, {})", pos.width, pos.height, pos.left, pos.top),
		);
	}
	Ok(())
}
