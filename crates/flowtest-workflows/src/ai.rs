// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flowtest_common_bridge::SecretString;
use flowtest_common_capabilities::{
	AiCommands, AiExchange, CredentialProvisioning, Verification, VisualPattern,
};
use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::error::{succeeded, WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiConfig {
	/// Endpoint override sent with a credential when the caller gives none.
	pub base_url: Option<String>,
	/// Refuse commands until a credential has been provisioned.
	pub require_credential: bool,
}

/// Credential provisioning, then free-text command execution.
///
/// Each step may be retried independently. The credential value itself is
/// never stored; only whether provisioning has succeeded.
pub struct AiWorkflow {
	credential: CredentialProvisioning,
	commands: AiCommands,
	config: AiConfig,
	provisioned: AtomicBool,
	last_exchange: Mutex<Option<Arc<AiExchange>>>,
	last_verification: Mutex<Option<Arc<Verification>>>,
}

impl AiWorkflow {
	pub fn new(credential: CredentialProvisioning, commands: AiCommands, config: AiConfig) -> Self {
		Self {
			credential,
			commands,
			config,
			provisioned: AtomicBool::new(false),
			last_exchange: Mutex::new(None),
			last_verification: Mutex::new(None),
		}
	}

	pub fn is_provisioned(&self) -> bool {
		self.provisioned.load(Ordering::Acquire)
	}

	pub fn last_exchange(&self) -> Option<Arc<AiExchange>> {
		self.last_exchange.lock().clone()
	}

	pub fn last_verification(&self) -> Option<Arc<Verification>> {
		self.last_verification.lock().clone()
	}

	/// Hand `key` to the host. Returns the host's message on success.
	#[instrument(skip(self, key))]
	pub async fn provision(
		&self,
		key: SecretString,
		base_url: Option<&str>,
	) -> WorkflowResult<Option<String>> {
		if key.is_blank() {
			return Err(WorkflowError::validation("API key must not be empty"));
		}
		let key = SecretString::new(key.expose().trim());
		let base_url = base_url
			.filter(|url| !url.trim().is_empty())
			.or(self.config.base_url.as_deref());

		let ((), message) = succeeded(self.credential.provision(&key, base_url).await?)?;
		self.provisioned.store(true, Ordering::Release);

		info!(custom_base_url = base_url.is_some(), "AI credential provisioned");
		Ok(message)
	}

	/// Submit a free-text command. Blank input never reaches the host.
	#[instrument(skip(self))]
	pub async fn execute(&self, command: &str) -> WorkflowResult<Arc<AiExchange>> {
		let command = command.trim();
		if command.is_empty() {
			return Err(WorkflowError::validation("command must not be empty"));
		}
		if self.config.require_credential && !self.is_provisioned() {
			return Err(WorkflowError::validation(
				"AI credential has not been provisioned",
			));
		}

		let (reply, message) = succeeded(self.commands.execute(command).await?)?;
		let exchange = Arc::new(AiExchange::new(command, reply, message));
		*self.last_exchange.lock() = Some(Arc::clone(&exchange));

		info!(executed = exchange.executed, "AI command interpreted");
		Ok(exchange)
	}

	#[instrument(skip(self))]
	pub async fn verify(&self, pattern: VisualPattern) -> WorkflowResult<Arc<Verification>> {
		let (check, message) = succeeded(self.commands.verify(pattern).await?)?;
		let verification = Arc::new(Verification::new(pattern, check, message));
		*self.last_verification.lock() = Some(Arc::clone(&verification));

		info!(
			%pattern,
			edge_ratio = verification.edge_ratio,
			verified = verification.verified,
			"visual verification finished"
		);
		Ok(verification)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::FailureKind;
	use flowtest_common_bridge::testing::ScriptedEndpoint;
	use flowtest_common_bridge::{BridgeError, Dispatcher};
	use flowtest_common_capabilities::operations::{
		EXECUTE_AI_COMMAND, SET_AI_API_KEY, VERIFY_VISUAL_RESULT,
	};
	use flowtest_common_capabilities::Capabilities;
	use serde_json::{json, Value};

	fn workflow(endpoint: ScriptedEndpoint, config: AiConfig) -> (AiWorkflow, Arc<ScriptedEndpoint>) {
		let endpoint = Arc::new(endpoint);
		let capabilities = Capabilities::new(Arc::new(Dispatcher::with_endpoint(endpoint.clone())));
		(
			AiWorkflow::new(capabilities.credential(), capabilities.ai(), config),
			endpoint,
		)
	}

	fn interpreting_host() -> ScriptedEndpoint {
		ScriptedEndpoint::new()
			.respond(SET_AI_API_KEY, json!({"success": true, "message": "API Key set"}))
			.respond(
				EXECUTE_AI_COMMAND,
				json!({
					"success": true,
					"command": "draw a red rectangle",
					"ai_interpretation": "create rectangle, fill red",
					"executed": false,
					"message": "interpretation complete"
				}),
			)
	}

	#[tokio::test]
	async fn blank_key_is_rejected_locally() {
		let (ai, endpoint) = workflow(interpreting_host(), AiConfig::default());
		let err = ai.provision(SecretString::new("  "), None).await.unwrap_err();
		assert_eq!(err.kind(), FailureKind::LocalValidationFailure);
		assert!(endpoint.calls().is_empty());
		assert!(!ai.is_provisioned());
	}

	#[tokio::test]
	async fn provisioning_flips_flag_and_uses_configured_base_url() {
		let (ai, endpoint) = workflow(
			interpreting_host(),
			AiConfig {
				base_url: Some("https://llm.example/v1".to_string()),
				require_credential: false,
			},
		);

		let message = ai.provision(SecretString::new("sk-1"), None).await.unwrap();
		assert_eq!(message.as_deref(), Some("API Key set"));
		assert!(ai.is_provisioned());
		assert_eq!(
			endpoint.calls()[0].args,
			vec![json!("sk-1"), json!("https://llm.example/v1")]
		);
	}

	#[tokio::test]
	async fn provisioned_key_is_sent_without_surrounding_whitespace() {
		let (ai, endpoint) = workflow(interpreting_host(), AiConfig::default());

		ai.provision(SecretString::new("  sk-1\n"), None).await.unwrap();
		assert_eq!(endpoint.calls()[0].args, vec![json!("sk-1"), json!(null)]);
	}

	#[tokio::test]
	async fn failed_provisioning_leaves_flag_untouched() {
		let (ai, _) = workflow(
			ScriptedEndpoint::new().respond(
				SET_AI_API_KEY,
				json!({"success": false, "error": "invalid key"}),
			),
			AiConfig::default(),
		);
		let err = ai.provision(SecretString::new("bad"), None).await.unwrap_err();
		assert_eq!(err, WorkflowError::Reported("invalid key".to_string()));
		assert!(!ai.is_provisioned());
	}

	#[tokio::test]
	async fn blank_command_never_dispatches() {
		let (ai, endpoint) = workflow(interpreting_host(), AiConfig::default());
		for blank in ["", "   ", "\t\n"] {
			let err = ai.execute(blank).await.unwrap_err();
			assert!(matches!(err, WorkflowError::Validation(_)));
		}
		assert_eq!(endpoint.call_count(EXECUTE_AI_COMMAND), 0);
		assert!(ai.last_exchange().is_none());
	}

	#[tokio::test]
	async fn command_runs_without_provisioning_by_default() {
		let (ai, endpoint) = workflow(interpreting_host(), AiConfig::default());

		let exchange = ai.execute("  draw a red rectangle ").await.unwrap();
		assert_eq!(exchange.command, "draw a red rectangle");
		assert_eq!(
			exchange.interpretation.as_deref(),
			Some("create rectangle, fill red")
		);
		assert!(!exchange.executed);
		assert_eq!(exchange.message.as_deref(), Some("interpretation complete"));
		assert_eq!(
			endpoint.calls()[0].args,
			vec![Value::String("draw a red rectangle".to_string())]
		);
	}

	#[tokio::test]
	async fn required_credential_gates_commands() {
		let (ai, endpoint) = workflow(
			interpreting_host(),
			AiConfig {
				base_url: None,
				require_credential: true,
			},
		);

		assert!(matches!(
			ai.execute("draw").await,
			Err(WorkflowError::Validation(_))
		));
		assert_eq!(endpoint.call_count(EXECUTE_AI_COMMAND), 0);

		ai.provision(SecretString::new("sk-1"), None).await.unwrap();
		ai.execute("draw").await.unwrap();
		assert_eq!(endpoint.call_count(EXECUTE_AI_COMMAND), 1);
	}

	#[tokio::test]
	async fn each_submission_replaces_the_exchange() {
		let (ai, _) = workflow(interpreting_host(), AiConfig::default());
		let first = ai.execute("first").await.unwrap();
		let second = ai.execute("second").await.unwrap();
		assert_eq!(first.command, "first");
		assert_eq!(ai.last_exchange(), Some(second));
	}

	#[tokio::test]
	async fn verify_against_host_without_operation() {
		let (ai, endpoint) = workflow(interpreting_host(), AiConfig::default());
		let err = ai.verify(VisualPattern::Circle).await.unwrap_err();
		assert_eq!(
			err,
			WorkflowError::Bridge(BridgeError::UnknownOperation(
				VERIFY_VISUAL_RESULT.to_string()
			))
		);
		assert_eq!(endpoint.call_count(VERIFY_VISUAL_RESULT), 0);
		assert!(ai.last_verification().is_none());
	}

	#[tokio::test]
	async fn verification_is_retained() {
		let (ai, _) = workflow(
			ScriptedEndpoint::new().respond(
				VERIFY_VISUAL_RESULT,
				json!({"success": true, "pattern": "line", "edge_ratio": 0.004, "verified": false,
					"message": "no obvious shapes detected"}),
			),
			AiConfig::default(),
		);

		let verification = ai.verify(VisualPattern::Line).await.unwrap();
		assert!(!verification.verified);
		assert_eq!(verification.pattern, VisualPattern::Line);
		assert_eq!(ai.last_verification(), Some(verification));
	}
}
