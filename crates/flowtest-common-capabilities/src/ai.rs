// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use flowtest_common_bridge::{BridgeResult, ContractViolation, Dispatcher, Outcome, ResultShape};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::operations::{EXECUTE_AI_COMMAND, VERIFY_VISUAL_RESULT};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AiCommandFields {
	#[serde(default)]
	pub command: Option<String>,
	#[serde(default)]
	pub ai_interpretation: Option<String>,
	#[serde(default)]
	pub executed: Option<bool>,
}

/// The host's answer to a free-text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReply {
	pub command: Option<String>,
	pub interpretation: Option<String>,
	pub executed: bool,
}

impl ResultShape for AiCommandFields {
	type Value = AiReply;

	fn into_value(self) -> Result<AiReply, ContractViolation> {
		Ok(AiReply {
			command: self.command,
			interpretation: self.ai_interpretation,
			executed: self
				.executed
				.ok_or_else(|| ContractViolation::missing("executed"))?,
		})
	}
}

/// One submitted command and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiExchange {
	pub command: String,
	pub interpretation: Option<String>,
	pub executed: bool,
	pub message: Option<String>,
}

impl AiExchange {
	/// `command` is the text that was submitted; the host's echo only fills in when it is missing.
	pub fn new(command: impl Into<String>, reply: AiReply, message: Option<String>) -> Self {
		let mut command = command.into();
		if command.is_empty() {
			command = reply.command.unwrap_or_default();
		}
		Self {
			command,
			interpretation: reply.interpretation,
			executed: reply.executed,
			message,
		}
	}
}

/// Shapes the host can check for on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualPattern {
	Line,
	Rectangle,
	Circle,
}

impl VisualPattern {
	pub const ALL: [VisualPattern; 3] = [Self::Line, Self::Rectangle, Self::Circle];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Line => "line",
			Self::Rectangle => "rectangle",
			Self::Circle => "circle",
		}
	}
}

impl fmt::Display for VisualPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for VisualPattern {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|pattern| pattern.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| format!("unknown pattern `{s}` (expected line, rectangle or circle)"))
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VerifyFields {
	#[serde(default)]
	pub pattern: Option<String>,
	#[serde(default)]
	pub edge_ratio: Option<f64>,
	#[serde(default)]
	pub verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualCheck {
	pub edge_ratio: f64,
	pub verified: bool,
}

impl ResultShape for VerifyFields {
	type Value = VisualCheck;

	fn into_value(self) -> Result<VisualCheck, ContractViolation> {
		Ok(VisualCheck {
			edge_ratio: self
				.edge_ratio
				.ok_or_else(|| ContractViolation::missing("edge_ratio"))?,
			verified: self
				.verified
				.ok_or_else(|| ContractViolation::missing("verified"))?,
		})
	}
}

/// Result of one visual verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
	pub pattern: VisualPattern,
	pub edge_ratio: f64,
	pub verified: bool,
	pub message: Option<String>,
}

impl Verification {
	pub fn new(pattern: VisualPattern, check: VisualCheck, message: Option<String>) -> Self {
		Self {
			pattern,
			edge_ratio: check.edge_ratio,
			verified: check.verified,
			message,
		}
	}
}

#[derive(Clone)]
pub struct AiCommands {
	dispatcher: Arc<Dispatcher>,
}

impl AiCommands {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub async fn execute(&self, command: &str) -> BridgeResult<Outcome<AiReply>> {
		self
			.dispatcher
			.invoke_envelope::<AiCommandFields>(EXECUTE_AI_COMMAND, vec![json!(command)])
			.await
	}

	pub async fn verify(&self, pattern: VisualPattern) -> BridgeResult<Outcome<VisualCheck>> {
		self
			.dispatcher
			.invoke_envelope::<VerifyFields>(VERIFY_VISUAL_RESULT, vec![json!(pattern.as_str())])
			.await
	}
}
