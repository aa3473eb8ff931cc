// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability facades over the FlowTest host bridge.
//!
//! One facade per capability domain, each a thin typed wrapper that fixes the
//! operation name and argument order and converts the host's envelope into a
//! tagged [`Outcome`](flowtest_common_bridge::Outcome). Facades hold no state
//! besides the shared [`Dispatcher`].

pub mod ai;
pub mod capture;
pub mod credential;
pub mod host;
pub mod operations;
pub mod process;
pub mod quality;
pub mod stress;

use std::sync::Arc;

use flowtest_common_bridge::Dispatcher;

pub use ai::{AiCommands, AiExchange, AiReply, Verification, VisualCheck, VisualPattern};
pub use capture::{Frame, FrameCapture, FrameDecodeError};
pub use credential::CredentialProvisioning;
pub use host::HostInfo;
pub use process::{FocusedWindow, Launched, ProcessControl, WindowInfo, WindowPosition};
pub use quality::{
	CodeMetrics, QualityChecks, StaticAnalysis, StaticIssue, TestCase, UnitTest, UnitTestRun,
	UnitTestScan,
};
pub use stress::{StressRecord, StressReport, StressTesting};

/// Hands out every facade from one injected dispatcher.
#[derive(Clone)]
pub struct Capabilities {
	dispatcher: Arc<Dispatcher>,
}

impl Capabilities {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub fn dispatcher(&self) -> &Arc<Dispatcher> {
		&self.dispatcher
	}

	pub fn process(&self) -> ProcessControl {
		ProcessControl::new(self.dispatcher.clone())
	}

	pub fn capture(&self) -> FrameCapture {
		FrameCapture::new(self.dispatcher.clone())
	}

	pub fn stress(&self) -> StressTesting {
		StressTesting::new(self.dispatcher.clone())
	}

	pub fn ai(&self) -> AiCommands {
		AiCommands::new(self.dispatcher.clone())
	}

	pub fn credential(&self) -> CredentialProvisioning {
		CredentialProvisioning::new(self.dispatcher.clone())
	}

	pub fn quality(&self) -> QualityChecks {
		QualityChecks::new(self.dispatcher.clone())
	}

	pub fn host(&self) -> HostInfo {
		HostInfo::new(self.dispatcher.clone())
	}
}
