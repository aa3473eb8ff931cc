// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session-oriented control loops built on the FlowTest capability facades.
//!
//! - [`MonitorSession`]: target-process lifecycle plus a cancellable frame-capture cadence
//! - [`StressRun`]: one-shot batch stress test with a consistency-checked record
//! - [`AiWorkflow`]: credential provisioning, command execution and visual verification
//! - [`QualityWorkflow`]: static analysis, unit tests and code metrics
//!
//! Every workflow takes its facades by injection and reports failures as
//! [`WorkflowError`].

pub mod ai;
pub mod error;
mod guard;
pub mod monitor;
pub mod quality;
pub mod stress;

pub use ai::{AiConfig, AiWorkflow};
pub use error::{succeeded, FailureKind, WorkflowError, WorkflowResult};
pub use monitor::{FrameOrdering, MonitorConfig, MonitorSession, SessionPhase, TargetProcess};
pub use quality::QualityWorkflow;
pub use stress::{clamp_iterations, StressRun, DEFAULT_ITERATIONS, MAX_ITERATIONS, MIN_ITERATIONS};
