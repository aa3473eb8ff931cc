// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use flowtest_common_bridge::{BridgeResult, ContractViolation, Dispatcher, Outcome, ResultShape};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operations::GET_SCREEN_FRAME;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Error)]
pub enum FrameDecodeError {
	#[error("frame is a data URL without a base64 payload")]
	NotBase64,

	#[error("frame payload is not valid base64: {0}")]
	Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FrameFields {
	#[serde(default)]
	pub image: Option<String>,
	#[serde(default)]
	pub width: Option<u32>,
	#[serde(default)]
	pub height: Option<u32>,
}

/// One captured screen image.
///
/// `image` is kept exactly as the host encoded it. `sequence` is assigned by
/// whoever orders frames (the monitoring session); a bare capture leaves it unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	pub image: String,
	pub width: u32,
	pub height: u32,
	pub sequence: Option<u64>,
	pub captured_at: DateTime<Utc>,
}

impl ResultShape for FrameFields {
	type Value = Frame;

	fn into_value(self) -> Result<Frame, ContractViolation> {
		Ok(Frame {
			image: self.image.ok_or_else(|| ContractViolation::missing("image"))?,
			width: self.width.ok_or_else(|| ContractViolation::missing("width"))?,
			height: self.height.ok_or_else(|| ContractViolation::missing("height"))?,
			sequence: None,
			captured_at: Utc::now(),
		})
	}
}

impl Frame {
	pub fn with_sequence(mut self, sequence: u64) -> Self {
		self.sequence = Some(sequence);
		self
	}

	/// MIME type declared by a data-URL image, e.g. `image/png`.
	pub fn mime_type(&self) -> Option<&str> {
		let rest = self.image.strip_prefix(DATA_URL_PREFIX)?;
		let end = rest.find([';', ','])?;
		Some(&rest[..end])
	}

	/// Decode the image payload. Accepts a `data:...;base64,` URL or bare base64.
	pub fn decode(&self) -> Result<Vec<u8>, FrameDecodeError> {
		let payload = match self.image.strip_prefix(DATA_URL_PREFIX) {
			Some(rest) => {
				let start = rest.find(BASE64_MARKER).ok_or(FrameDecodeError::NotBase64)?;
				&rest[start + BASE64_MARKER.len()..]
			}
			None => self.image.as_str(),
		};
		Ok(STANDARD.decode(payload.trim())?)
	}
}

#[derive(Clone)]
pub struct FrameCapture {
	dispatcher: Arc<Dispatcher>,
}

impl FrameCapture {
	pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
		Self { dispatcher }
	}

	pub async fn frame(&self) -> BridgeResult<Outcome<Frame>> {
		self
			.dispatcher
			.invoke_envelope::<FrameFields>(GET_SCREEN_FRAME, vec![])
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

	fn frame(image: &str) -> Frame {
		Frame {
			image: image.to_string(),
			width: 2,
			height: 2,
			sequence: None,
			captured_at: Utc::now(),
		}
	}

	#[test]
	fn decodes_data_url() {
		let encoded = STANDARD.encode(b"\x89PNG");
		let frame = frame(&format!("data:image/png;base64,{encoded}"));
		assert_eq!(frame.mime_type(), Some("image/png"));
		assert_eq!(assert_ok!(frame.decode()), b"\x89PNG".to_vec());
	}

	#[test]
	fn decodes_bare_base64() {
		let frame = frame(&STANDARD.encode(b"raw"));
		assert_eq!(frame.mime_type(), None);
		assert_eq!(assert_ok!(frame.decode()), b"raw".to_vec());
	}

	#[test]
	fn rejects_non_base64_data_url() {
		let frame = frame("data:text/plain,hello");
		assert!(matches!(frame.decode(), Err(FrameDecodeError::NotBase64)));
	}

	#[tokio::test]
	async fn capture_requires_image_and_dimensions() {
		let endpoint = Arc::new(
			ScriptedEndpoint::new()
				.respond(GET_SCREEN_FRAME, json!({"success": true, "image": "AAAA"})),
		);
		let capture = FrameCapture::new(Arc::new(Dispatcher::with_endpoint(endpoint)));

		let err = assert_err!(capture.frame().await);
		assert_eq!(
			err,
			BridgeError::invalid_result(GET_SCREEN_FRAME, "missing field `width`")
		);
	}

	#[tokio::test]
	async fn capture_returns_untagged_frame() {
		let endpoint = Arc::new(ScriptedEndpoint::new().respond(
			GET_SCREEN_FRAME,
			json!({"success": true, "image": "data:image/png;base64,AAAA", "width": 1920, "height": 1080}),
		));
		let capture = FrameCapture::new(Arc::new(Dispatcher::with_endpoint(endpoint)));

		let frame = assert_ok!(assert_ok!(capture.frame().await).into_result());
		assert_eq!((frame.width, frame.height), (1920, 1080));
		assert_eq!(frame.sequence, None);
	}
}
