// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Live monitoring of the target application.
//!
//! A [`MonitorSession`] owns the target-process handle and, while polling,
//! a cadence task that captures one frame per period. The session moves
//! through three phases:
//!
//! ```text
//! Idle --launch--> Ready --start_polling--> Polling
//!                    ^                         |
//!                    +------stop_polling-------+
//! Ready | Polling --close / target exited--> Idle
//! ```
//!
//! Captures are fire-and-forget and may overlap. Each one is tagged with a
//! sequence number when it is dispatched, so out-of-order completions can be
//! reconciled according to [`FrameOrdering`].

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use flowtest_common_bridge::HostEvent;
use flowtest_common_capabilities::{Frame, FrameCapture, Launched, ProcessControl};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{succeeded, WorkflowError, WorkflowResult};
use crate::guard::InFlight;

pub const DEFAULT_CADENCE: Duration = Duration::from_millis(500);

const NOT_RUNNING: &str = "target application is not running";

/// How out-of-order capture completions are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameOrdering {
	/// Drop a frame dispatched before the one currently shown.
	#[default]
	DiscardStale,
	/// Show whichever capture resolved last.
	LastResolved,
}

impl FrameOrdering {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::DiscardStale => "discard-stale",
			Self::LastResolved => "last-resolved",
		}
	}
}

impl fmt::Display for FrameOrdering {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FrameOrdering {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"discard-stale" | "discard_stale" => Ok(Self::DiscardStale),
			"last-resolved" | "last_resolved" => Ok(Self::LastResolved),
			other => Err(format!(
				"unknown frame ordering `{other}` (expected discard-stale or last-resolved)"
			)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
	pub cadence: Duration,
	pub frame_ordering: FrameOrdering,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			cadence: DEFAULT_CADENCE,
			frame_ordering: FrameOrdering::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
	Idle,
	Ready,
	Polling,
}

/// Handle to the running target application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProcess {
	pub pid: u32,
	pub path: Option<String>,
	pub launched_at: DateTime<Utc>,
}

impl From<Launched> for TargetProcess {
	fn from(launched: Launched) -> Self {
		Self {
			pid: launched.pid,
			path: launched.path,
			launched_at: Utc::now(),
		}
	}
}

struct Cadence {
	epoch: u64,
	token: CancellationToken,
	handle: JoinHandle<()>,
}

impl Cadence {
	fn cancel(self) {
		self.token.cancel();
		self.handle.abort();
	}
}

#[derive(Default)]
struct SessionState {
	target: Option<TargetProcess>,
	cadence: Option<Cadence>,
	last_frame: Option<Arc<Frame>>,
	next_sequence: u64,
	shown_sequence: Option<u64>,
	epoch: u64,
}

struct Shared {
	id: Uuid,
	config: MonitorConfig,
	process: ProcessControl,
	capture: FrameCapture,
	lifecycle: InFlight,
	state: Mutex<SessionState>,
	frames: watch::Sender<Option<Arc<Frame>>>,
}

/// Client-side state machine for one target application.
///
/// Dropping the session cancels its cadence.
pub struct MonitorSession {
	shared: Arc<Shared>,
}

impl MonitorSession {
	pub fn new(process: ProcessControl, capture: FrameCapture, config: MonitorConfig) -> Self {
		let (frames, _) = watch::channel(None);
		Self {
			shared: Arc::new(Shared {
				id: Uuid::new_v4(),
				config,
				process,
				capture,
				lifecycle: InFlight::default(),
				state: Mutex::new(SessionState::default()),
				frames,
			}),
		}
	}

	pub fn id(&self) -> Uuid {
		self.shared.id
	}

	pub fn config(&self) -> MonitorConfig {
		self.shared.config
	}

	pub fn phase(&self) -> SessionPhase {
		let state = self.shared.state.lock();
		match (&state.target, &state.cadence) {
			(None, _) => SessionPhase::Idle,
			(Some(_), None) => SessionPhase::Ready,
			(Some(_), Some(_)) => SessionPhase::Polling,
		}
	}

	pub fn target(&self) -> Option<TargetProcess> {
		self.shared.state.lock().target.clone()
	}

	pub fn is_polling(&self) -> bool {
		self.shared.state.lock().cadence.is_some()
	}

	/// Latest frame shown, if any.
	pub fn last_frame(&self) -> Option<Arc<Frame>> {
		self.shared.state.lock().last_frame.clone()
	}

	/// Watch the displayed frame. The receiver sees only the newest value.
	pub fn subscribe_frames(&self) -> watch::Receiver<Option<Arc<Frame>>> {
		self.shared.frames.subscribe()
	}

	/// Launch the target application. Polling is not started.
	#[instrument(skip(self), fields(session_id = %self.shared.id))]
	pub async fn launch(&self) -> WorkflowResult<TargetProcess> {
		let _guard = self.shared.lifecycle.try_begin("target launch or close")?;
		if self.shared.state.lock().target.is_some() {
			return Err(WorkflowError::validation(
				"target application is already running",
			));
		}

		let (launched, _) = succeeded(self.shared.process.launch().await?)?;
		let target = TargetProcess::from(launched);
		self.shared.state.lock().target = Some(target.clone());

		info!(pid = target.pid, path = ?target.path, "target application launched");
		Ok(target)
	}

	/// Close the target application. On success the session returns to idle.
	#[instrument(skip(self), fields(session_id = %self.shared.id))]
	pub async fn close(&self) -> WorkflowResult<()> {
		let _guard = self.shared.lifecycle.try_begin("target launch or close")?;
		succeeded(self.shared.process.close().await?)?;
		self.shared.collapse_to_idle("closed");
		Ok(())
	}

	/// Record that the host saw the target exit. Ignored for a different pid.
	pub fn target_exited(&self, pid: Option<u32>) -> bool {
		self.shared.target_exited(pid)
	}

	/// Forward host `target_exited` events into this session until it is dropped.
	pub fn follow_host_events(&self, events: broadcast::Receiver<HostEvent>) -> JoinHandle<()> {
		let shared = Arc::downgrade(&self.shared);
		tokio::spawn(follow_host_events(shared, events))
	}

	/// Begin the capture cadence: one capture now, then one per period.
	///
	/// Starting while already polling leaves the existing cadence untouched.
	pub fn start_polling(&self) -> WorkflowResult<()> {
		let mut state = self.shared.state.lock();
		if state.target.is_none() {
			return Err(WorkflowError::validation(NOT_RUNNING));
		}
		if state.cadence.is_some() {
			debug!(session_id = %self.shared.id, "already polling");
			return Ok(());
		}

		state.epoch += 1;
		let epoch = state.epoch;
		let token = CancellationToken::new();
		let handle = tokio::spawn(run_cadence(
			Arc::clone(&self.shared),
			epoch,
			token.clone(),
		));
		state.cadence = Some(Cadence {
			epoch,
			token,
			handle,
		});

		info!(
			session_id = %self.shared.id,
			cadence_ms = self.shared.config.cadence.as_millis() as u64,
			"polling started"
		);
		Ok(())
	}

	/// Stop the cadence. Returns whether it was running.
	pub fn stop_polling(&self) -> bool {
		let stopped = self.shared.stop_cadence();
		if stopped {
			info!(session_id = %self.shared.id, "polling stopped");
		}
		stopped
	}

	/// Capture one frame now, independent of the cadence.
	#[instrument(skip(self), fields(session_id = %self.shared.id))]
	pub async fn capture_once(&self) -> WorkflowResult<Arc<Frame>> {
		let sequence = self
			.shared
			.begin_capture(None)
			.ok_or_else(|| WorkflowError::validation(NOT_RUNNING))?;
		self.shared.capture_and_store(sequence, None).await
	}
}

impl Drop for MonitorSession {
	fn drop(&mut self) {
		self.shared.stop_cadence();
	}
}

impl Shared {
	fn stop_cadence(&self) -> bool {
		match self.state.lock().cadence.take() {
			Some(cadence) => {
				cadence.cancel();
				true
			}
			None => false,
		}
	}

	/// Cancel the cadence and drop the target under one lock.
	fn collapse_to_idle(&self, reason: &str) {
		let mut state = self.state.lock();
		if let Some(cadence) = state.cadence.take() {
			cadence.cancel();
		}
		let target = state.target.take();
		drop(state);

		info!(
			session_id = %self.id,
			pid = target.as_ref().map(|t| t.pid),
			reason,
			"target application gone"
		);
	}

	fn target_exited(&self, pid: Option<u32>) -> bool {
		let matches = {
			let state = self.state.lock();
			match (&state.target, pid) {
				(None, _) => false,
				(Some(_), None) => true,
				(Some(target), Some(pid)) => target.pid == pid,
			}
		};
		if matches {
			self.collapse_to_idle("exited");
		}
		matches
	}

	/// Reserve a sequence number for a capture about to be dispatched.
	///
	/// A cadence capture passes its epoch and is refused once that cadence is gone.
	fn begin_capture(&self, epoch: Option<u64>) -> Option<u64> {
		let mut state = self.state.lock();
		state.target.as_ref()?;
		if let Some(epoch) = epoch {
			if state.cadence.as_ref().map(|c| c.epoch) != Some(epoch) {
				return None;
			}
		}
		let sequence = state.next_sequence;
		state.next_sequence += 1;
		Some(sequence)
	}

	async fn capture_and_store(
		&self,
		sequence: u64,
		epoch: Option<u64>,
	) -> WorkflowResult<Arc<Frame>> {
		let (frame, _) = succeeded(self.capture.frame().await?)?;
		let frame = Arc::new(frame.with_sequence(sequence));
		self.offer(Arc::clone(&frame), sequence, epoch);
		Ok(frame)
	}

	/// Show `frame` unless its cadence was stopped, the target is gone, or it is stale.
	fn offer(&self, frame: Arc<Frame>, sequence: u64, epoch: Option<u64>) -> bool {
		let mut state = self.state.lock();
		if state.target.is_none() {
			debug!(session_id = %self.id, sequence, "discarding frame: target gone");
			return false;
		}
		if let Some(epoch) = epoch {
			if state.cadence.as_ref().map(|c| c.epoch) != Some(epoch) {
				debug!(session_id = %self.id, sequence, "discarding frame: polling stopped");
				return false;
			}
		}
		if self.config.frame_ordering == FrameOrdering::DiscardStale
			&& state.shown_sequence.is_some_and(|shown| shown >= sequence)
		{
			debug!(session_id = %self.id, sequence, "discarding stale frame");
			return false;
		}

		state.shown_sequence = Some(sequence);
		state.last_frame = Some(Arc::clone(&frame));
		self.frames.send_replace(Some(frame));
		true
	}
}

async fn run_cadence(shared: Arc<Shared>, epoch: u64, token: CancellationToken) {
	let mut ticker = tokio::time::interval(shared.config.cadence);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			biased;
			_ = token.cancelled() => break,
			_ = ticker.tick() => {
				let Some(sequence) = shared.begin_capture(Some(epoch)) else {
					break;
				};
				let shared = Arc::clone(&shared);
				tokio::spawn(async move {
					if let Err(e) = shared.capture_and_store(sequence, Some(epoch)).await {
						warn!(session_id = %shared.id, sequence, error = %e, "frame capture failed");
					}
				});
			}
		}
	}
}

async fn follow_host_events(shared: Weak<Shared>, mut events: broadcast::Receiver<HostEvent>) {
	loop {
		match events.recv().await {
			Ok(HostEvent::TargetExited { pid, exit_code }) => {
				let Some(shared) = shared.upgrade() else {
					break;
				};
				if shared.target_exited(pid) {
					info!(session_id = %shared.id, ?exit_code, "host reported target exit");
				}
			}
			Ok(HostEvent::Other { .. }) => {}
			Err(broadcast::error::RecvError::Lagged(skipped)) => {
				warn!(skipped, "missed host events");
			}
			Err(broadcast::error::RecvError::Closed) => break,
		}
	}
}
