// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use flowtest_common_bridge::{
	BridgeResult, ContractViolation, Dispatcher, NoFields, Outcome, ResultShape,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operations::{
	CLOSE_TARGET_APP, FOCUS_TARGET_WINDOW, GET_WINDOW_INFO, LAUNCH_TARGET_APP,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LaunchFields {
	#[serde(default)]
	pub pid: Option<u32>,
	#[serde(default)]
	pub path: Option<String>,
}

/// A successfully launched target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
	pub pid: u32,
	pub path: Option<String>,
}

impl ResultShape for LaunchFields {
	type Value = Launched;

	fn into_value(self) -> Result<Launched, ContractViolation> {
		let pid = self.pid.ok_or_else(|| ContractViolation::missing("pid"))?;
		Ok(Launched {
			pid,
			path: self.path,
		})
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WindowInfoFields {
	#[serde(default)]
	pub all_windows: Option<Vec<String>>,
	#[serde(default)]
	pub target_windows: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
	pub all_windows: Vec<String>,
	pub target_windows: Vec<String>,
}

impl ResultShape for WindowInfoFields {
	type Value = WindowInfo;

	fn into_value(self) -> Result<WindowInfo, ContractViolation> {
		Ok(WindowInfo {
			all_windows: self.all_windows.unwrap_or_default(),
			target_windows: self.target_windows.unwrap_or_default(),
		})
	}
}

/// Window geometry, sent by the host as `[left, top, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "(i32, i32, i32, i32)", into = "(i32, i32, i32, i32)")]
pub struct WindowPosition {
	pub left: i32,
	pub top: i32,
	pub width: i32,
	pub height: i32,
}

impl From<(i32, i32, i32, i32)> for WindowPosition {
	fn from((left, top, width, height): (i32, i32, i32, i32)) -> Self {
		Self {
			left,
			top,
			width,
			height,
		}
	}
}

impl From<WindowPosition> for (i32, i32, i32, i32) {
	fn from(p: WindowPosition) -> Self {
		(p.left, p.top, p.width, p.height)
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FocusFields {
	#[serde(default)]
	pub window_title: Option<String>,
	#[serde(default)]
	pub position: Option<WindowPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedWindow {
	pub window_title: Option<String>,
	pub position: Option<WindowPosition>,
}

impl ResultShape for FocusFields {
	type Value = FocusedWindow;

	fn into_value(self) -> Result<FocusedWindow, ContractViolation> {
		Ok(FocusedWindow {
			window_title: self.window_title,
			position: self.position,
		})
	}
}

/// Target-process lifecycle and window introspection.
#[derive(Clone)]
pub struct ProcessControl {
	dispatcher: Arc<Dispatcher>,
}

impl ProcessControl {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub async fn launch(&self) -> BridgeResult<Outcome<Launched>> {
		self
			.dispatcher
			.invoke_envelope::<LaunchFields>(LAUNCH_TARGET_APP, vec![])
			.await
	}

	pub async fn close(&self) -> BridgeResult<Outcome<()>> {
		self
			.dispatcher
			.invoke_envelope::<NoFields>(CLOSE_TARGET_APP, vec![])
			.await
	}

	pub async fn window_info(&self) -> BridgeResult<Outcome<WindowInfo>> {
		self
			.dispatcher
			.invoke_envelope::<WindowInfoFields>(GET_WINDOW_INFO, vec![])
			.await
	}

	/// Focus the window titled `title`, or let the host pick the target window.
	pub async fn focus_window(&self, title: Option<&str>) -> BridgeResult<Outcome<FocusedWindow>> {
		let title = title.map_or(Value::Null, |t| Value::String(t.to_string()));
		self
			.dispatcher
			.invoke_envelope::<FocusFields>(FOCUS_TARGET_WINDOW, vec![title])
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flowtest_common_bridge::testing::ScriptedEndpoint;
	use flowtest_common_bridge::BridgeError;
	use serde_json::json;
	use tokio_test::{assert_err, assert_ok};

	fn control(endpoint: ScriptedEndpoint) -> (ProcessControl, Arc<ScriptedEndpoint>) {
		let endpoint = Arc::new(endpoint);
		let dispatcher = Arc::new(Dispatcher::with_endpoint(endpoint.clone()));
		(ProcessControl::new(dispatcher), endpoint)
	}

	#[tokio::test]
	async fn launch_yields_pid_and_path() {
		let (control, _) = control(ScriptedEndpoint::new().respond(
			LAUNCH_TARGET_APP,
			json!({"success": true, "pid": 4242, "path": "C:/apps/diagramscene.exe"}),
		));

		let outcome = assert_ok!(control.launch().await);
		assert_eq!(
			outcome,
			Outcome::Succeeded {
				value: Launched {
					pid: 4242,
					path: Some("C:/apps/diagramscene.exe".to_string())
				},
				message: None
			}
		);
	}

	#[tokio::test]
	async fn launch_without_pid_breaks_contract() {
		let (control, _) =
			control(ScriptedEndpoint::new().respond(LAUNCH_TARGET_APP, json!({"success": true})));
		let err = assert_err!(control.launch().await);
		assert!(matches!(err, BridgeError::InvalidResult { .. }));
	}

	#[tokio::test]
	async fn close_failure_is_reported_not_raised() {
		let (control, _) = control(ScriptedEndpoint::new().respond(
			CLOSE_TARGET_APP,
			json!({"success": false, "error": "not running"}),
		));
		let outcome = assert_ok!(control.close().await);
		assert_eq!(outcome.into_result(), Err("not running".to_string()));
	}

	#[tokio::test]
	async fn focus_forwards_null_for_missing_title() {
		let (control, endpoint) = control(ScriptedEndpoint::new().respond(
			FOCUS_TARGET_WINDOW,
			json!({"success": true, "window_title": "diagram", "position": [10, 20, 800, 600]}),
		));

		let outcome = assert_ok!(control.focus_window(None).await);
		assert_eq!(
			outcome.into_result(),
			Ok(FocusedWindow {
				window_title: Some("diagram".to_string()),
				position: Some(WindowPosition {
					left: 10,
					top: 20,
					width: 800,
					height: 600
				})
			})
		);
		assert_eq!(endpoint.calls()[0].args, vec![Value::Null]);
	}

	#[tokio::test]
	async fn window_info_defaults_missing_lists() {
		let (control, _) = control(ScriptedEndpoint::new().respond(
			GET_WINDOW_INFO,
			json!({"success": true, "target_windows": ["diagram"]}),
		));
		let info = assert_ok!(assert_ok!(control.window_info().await).into_result());
		assert!(info.all_windows.is_empty());
		assert_eq!(info.target_windows, vec!["diagram".to_string()]);
	}
}
