// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Remote-call bridge for the FlowTest control surface.
//!
//! This crate provides:
//! - [`Envelope`]: the `{ success, error?, message?, ... }` result contract shared
//!   by every host operation, and its conversion into a tagged [`Outcome`]
//! - [`Dispatcher`]: typed invocation of named host operations with readiness
//!   and operation-existence checks
//! - [`Endpoint`]: the seam the dispatcher calls through
//! - [`RemoteEndpoint`]: a newline-delimited JSON transport to the host process
//! - `ScriptedEndpoint` (feature `testing`): an in-memory endpoint for tests

pub mod client;
pub mod dispatcher;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod protocol;
pub mod secret;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ConnectOptions, RemoteEndpoint};
pub use dispatcher::Dispatcher;
pub use endpoint::Endpoint;
pub use envelope::{ContractViolation, Envelope, NoFields, Outcome, ResultShape};
pub use error::{BridgeError, BridgeResult};
pub use protocol::HostEvent;
pub use secret::{SecretString, REDACTED};
