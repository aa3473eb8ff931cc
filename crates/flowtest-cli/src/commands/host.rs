// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use colored::Colorize;

use crate::bridge::HostLink;
use crate::output;

pub async fn run(link: &HostLink) -> anyhow::Result<()> {
	let host = link.capabilities().host();
	let reply = host.ping().await?;
	let version = host.version().await?;

	output::field("Host", link.config().connect_options().addr().cyan());
	output::field("Reply", reply);
	output::field("Version", version.yellow());
	Ok(())
}
