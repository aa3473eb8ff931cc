// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use clap::Subcommand;
use colored::Colorize;
use flowtest_common_bridge::SecretString;
use flowtest_common_capabilities::{AiExchange, Verification, VisualPattern};

use crate::bridge::HostLink;
use crate::output;

#[derive(Debug, Subcommand)]
pub enum AiCommand {
	/// Provision the AI API key on the host
	Key(KeyArgs),

	/// Have the host interpret and run a free-text command
	Exec(ExecArgs),

	/// Check the current frame for a drawn shape
	Verify(VerifyArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct KeyArgs {
	/// API key
	#[arg(long, env = "FLOWTEST_AI_API_KEY", hide_env_values = true)]
	pub key: String,

	/// Endpoint override. Defaults to ai.base_url.
	#[arg(long)]
	pub base_url: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ExecArgs {
	/// Provision this key before running the command
	#[arg(long, env = "FLOWTEST_AI_API_KEY", hide_env_values = true)]
	pub key: Option<String>,

	/// The command, e.g. "draw a red rectangle"
	#[arg(required = true, trailing_var_arg = true)]
	pub command: Vec<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct VerifyArgs {
	/// line, rectangle or circle
	pub pattern: VisualPattern,
}

pub async fn run(link: &HostLink, command: AiCommand) -> anyhow::Result<()> {
	let ai = link.ai_workflow();
	match command {
		AiCommand::Key(args) => {
			let message = ai
				.provision(SecretString::from(args.key), args.base_url.as_deref())
				.await?;
			output::ok(message.unwrap_or_else(|| "API key set".to_string()));
		}
		AiCommand::Exec(args) => {
			if let Some(key) = args.key {
				ai.provision(SecretString::from(key), None).await?;
			}
			let exchange = ai.execute(&args.command.join(" ")).await?;
			print_exchange(&exchange);
		}
		AiCommand::Verify(args) => {
			let verification = ai.verify(args.pattern).await?;
			print_verification(&verification);
		}
	}
	Ok(())
}

pub fn print_exchange(exchange: &AiExchange) {
	output::field("Command", &exchange.command);
	if let Some(interpretation) = &exchange.interpretation {
		output::field("Interpretation", interpretation.cyan());
	}
	output::field("Executed", output::yes_no(exchange.executed));
	if let Some(message) = &exchange.message {
		output::note(message);
	}
}

pub fn print_verification(verification: &Verification) {
	output::field("Pattern", verification.pattern);
	output::field("Edge ratio", format!("{:.4}", verification.edge_ratio));
	output::field("Verified", output::yes_no(verification.verified));
	if let Some(message) = &verification.message {
		output::note(message);
	}
}
