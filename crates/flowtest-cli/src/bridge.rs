// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection to the host, shared by every command.

use std::sync::Arc;

use flowtest_cli_config::FlowtestConfig;
use flowtest_common_bridge::{Dispatcher, HostEvent, RemoteEndpoint};
use flowtest_common_capabilities::Capabilities;
use flowtest_workflows::{AiWorkflow, MonitorSession, QualityWorkflow, StressRun};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub struct HostLink {
	capabilities: Capabilities,
	remote: Option<Arc<RemoteEndpoint>>,
	config: FlowtestConfig,
}

impl HostLink {
	/// Connect to the configured host.
	///
	/// An unreachable host is not fatal: the dispatcher stays unattached and
	/// every operation fails with `EndpointNotReady`.
	pub async fn connect(config: &FlowtestConfig) -> Self {
		let dispatcher = Dispatcher::new().with_call_timeout(config.bridge.call_timeout);
		let options = config.connect_options();

		let remote = match RemoteEndpoint::connect(&options).await {
			Ok(remote) => {
				let remote = Arc::new(remote);
				info!(
					addr = %options.addr(),
					operations = remote.operations().count(),
					"connected to host"
				);
				dispatcher.attach(remote.clone()).await;
				Some(remote)
			}
			Err(e) => {
				warn!(addr = %options.addr(), error = %e, "host unreachable");
				None
			}
		};

		Self::with_dispatcher(Arc::new(dispatcher), remote, config.clone())
	}

	pub fn with_dispatcher(
		dispatcher: Arc<Dispatcher>,
		remote: Option<Arc<RemoteEndpoint>>,
		config: FlowtestConfig,
	) -> Self {
		Self {
			capabilities: Capabilities::new(dispatcher),
			remote,
			config,
		}
	}

	pub fn capabilities(&self) -> &Capabilities {
		&self.capabilities
	}

	pub fn config(&self) -> &FlowtestConfig {
		&self.config
	}

	pub fn is_connected(&self) -> bool {
		self
			.remote
			.as_ref()
			.is_some_and(|remote| remote.is_connected())
	}

	pub fn events(&self) -> Option<broadcast::Receiver<HostEvent>> {
		self.remote.as_ref().map(|remote| remote.subscribe())
	}

	/// A monitoring session that also follows the host's `target_exited` events.
	pub fn monitor_session(&self) -> MonitorSession {
		let session = MonitorSession::new(
			self.capabilities.process(),
			self.capabilities.capture(),
			self.config.monitor_config(),
		);
		if let Some(events) = self.events() {
			session.follow_host_events(events);
		}
		session
	}

	pub fn stress_run(&self) -> StressRun {
		StressRun::new(self.capabilities.stress())
	}

	pub fn ai_workflow(&self) -> AiWorkflow {
		AiWorkflow::new(
			self.capabilities.credential(),
			self.capabilities.ai(),
			self.config.ai_config(),
		)
	}

	pub fn quality_workflow(&self) -> QualityWorkflow {
		QualityWorkflow::new(self.capabilities.quality())
	}
}
