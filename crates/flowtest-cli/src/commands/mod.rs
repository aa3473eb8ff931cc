// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod ai;
pub mod capture;
pub mod host;
pub mod monitor;
pub mod process;
pub mod quality;
pub mod stress;

use crate::args::Command;
use crate::bridge::HostLink;
use crate::console;

pub async fn run(command: Command, link: &HostLink) -> anyhow::Result<()> {
	match command {
		Command::Ping => host::run(link).await,
		Command::Launch => process::launch(link).await,
		Command::Close => process::close(link).await,
		Command::Capture(args) => capture::run(link, args).await,
		Command::Windows => process::windows(link).await,
		Command::Focus(args) => process::focus(link, args).await,
		Command::Monitor(args) => monitor::run(link, args).await,
		Command::Stress(args) => stress::run(link, args).await,
		Command::Ai(command) => ai::run(link, command).await,
		Command::Quality(command) => quality::run(link, command).await,
		Command::Console => console::run(link).await,
	}
}
