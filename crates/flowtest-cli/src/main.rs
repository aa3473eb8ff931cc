// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod args;
mod bridge;
mod commands;
mod console;
mod output;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use args::Cli;
use bridge::HostLink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let config = flowtest_cli_config::load_config_with_cli(cli.overrides())?;
	init_tracing(&config.logging.level, cli.log_json);
	debug!(?config, "configuration loaded");

	let link = HostLink::connect(&config).await;
	if let Err(e) = commands::run(cli.command, &link).await {
		output::error(&e);
		std::process::exit(1);
	}
	Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level, falling back to `info`.
fn init_tracing(level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr);
	if json {
		builder.json().init();
	} else {
		builder.init();
	}
}
