// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::WorkflowError;

/// At most one outstanding call per workflow instance.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
	busy: AtomicBool,
}

impl InFlight {
	pub(crate) fn try_begin(&self, activity: &'static str) -> Result<InFlightGuard<'_>, WorkflowError> {
		self
			.busy
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.map_err(|_| WorkflowError::Busy(activity))?;
		Ok(InFlightGuard { busy: &self.busy })
	}

	pub(crate) fn is_busy(&self) -> bool {
		self.busy.load(Ordering::Acquire)
	}
}

/// Clears the flag when dropped, including when the call future is dropped mid-flight.
pub(crate) struct InFlightGuard<'a> {
	busy: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.busy.store(false, Ordering::Release);
	}
}
