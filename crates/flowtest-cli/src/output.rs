// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use flowtest_common_bridge::{BridgeError, NoFields};
use flowtest_common_capabilities::Frame;
use flowtest_workflows::{FailureKind, WorkflowError};
use serde::Serialize;

pub fn field(label: &str, value: impl std::fmt::Display) {
	println!("{}: {}", label.bold(), value);
}

pub fn ok(message: impl std::fmt::Display) {
	println!("{} {}", "✓".green(), message);
}

pub fn note(message: impl std::fmt::Display) {
	println!("{}", message.to_string().dimmed());
}

pub fn failure(error: &WorkflowError) {
	eprintln!("{} {} {}", "✗".red(), failure_label(error.kind()).red().bold(), error);
}

/// Print a command error, labelling workflow and bridge failures by kind.
pub fn error(err: &anyhow::Error) {
	if let Some(e) = err.downcast_ref::<WorkflowError>() {
		failure(e);
	} else if let Some(e) = err.downcast_ref::<BridgeError>() {
		failure(&WorkflowError::from(e.clone()));
	} else {
		eprintln!("{} {:#}", "✗".red(), err);
	}
}

/// `--json` rendering: the record on success, a failed result envelope otherwise.
pub fn json_outcome<T: Serialize + ?Sized>(
	result: Result<&T, &WorkflowError>,
) -> serde_json::Result<String> {
	match result {
		Ok(value) => serde_json::to_string_pretty(value),
		Err(e) => serde_json::to_string_pretty(&e.into_envelope::<NoFields>()),
	}
}

/// Print [`json_outcome`] and hand any failure back so the exit status reflects it.
pub fn print_json<T: Serialize + ?Sized>(
	result: Result<&T, &WorkflowError>,
) -> anyhow::Result<()> {
	println!("{}", json_outcome(result)?);
	result.map(|_| ()).map_err(|e| e.clone().into())
}

fn failure_label(kind: FailureKind) -> &'static str {
	match kind {
		FailureKind::EndpointNotReady => "[not connected]",
		FailureKind::UnknownOperation => "[unsupported]",
		FailureKind::RemoteRejected => "[rejected]",
		FailureKind::Timeout => "[timeout]",
		FailureKind::InvalidResult => "[invalid result]",
		FailureKind::ApplicationReportedFailure => "[failed]",
		FailureKind::LocalValidationFailure => "[invalid]",
		FailureKind::Busy => "[busy]",
	}
}

pub fn yes_no(value: bool) -> colored::ColoredString {
	if value {
		"yes".green()
	} else {
		"no".yellow()
	}
}

fn extension(frame: &Frame) -> &'static str {
	match frame.mime_type() {
		Some("image/png") => "png",
		Some("image/jpeg") | Some("image/jpg") => "jpg",
		Some("image/bmp") => "bmp",
		_ => "png",
	}
}

/// File name for a frame saved into a directory.
pub fn frame_file_name(frame: &Frame) -> String {
	let stamp = frame.captured_at.format("%Y%m%dT%H%M%S%.3f");
	match frame.sequence {
		Some(sequence) => format!("frame-{stamp}-{sequence:06}.{}", extension(frame)),
		None => format!("frame-{stamp}.{}", extension(frame)),
	}
}

/// Decode `frame` and write it to `target`.
///
/// A `target` that is an existing directory receives a generated file name.
pub fn save_frame(frame: &Frame, target: &Path) -> anyhow::Result<PathBuf> {
	let path = if target.is_dir() {
		target.join(frame_file_name(frame))
	} else {
		target.to_path_buf()
	};
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)
			.with_context(|| format!("creating {}", parent.display()))?;
	}
	let bytes = frame.decode()?;
	std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
	Ok(path)
}
