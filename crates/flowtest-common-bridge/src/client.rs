// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::protocol::*;
use crate::secret::SecretString;

/// Rejection text for calls that were pending, or issued, after the connection dropped.
pub const DISCONNECTED: &str = "bridge_disconnected";

const EVENT_CAPACITY: usize = 64;

type PendingRequests = HashMap<u64, oneshot::Sender<Result<Value, String>>>;

#[derive(Debug, Error)]
pub enum ConnectError {
	#[error("bridge connection to {addr} failed: {source}")]
	Io {
		addr: String,
		#[source]
		source: std::io::Error,
	},

	#[error("bridge connection to {addr} timed out after {timeout:?}")]
	Timeout { addr: String, timeout: Duration },

	#[error("bridge rejected the auth token")]
	AuthFailed,

	#[error("bridge handshake failed: {0}")]
	Handshake(String),
}

/// Where and how to reach the host bridge.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
	pub host: String,
	pub port: u16,
	pub token: Option<SecretString>,
	/// Bounds the TCP connect and each handshake call.
	pub connect_timeout: Duration,
}

impl ConnectOptions {
	pub fn addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

/// [`Endpoint`] backed by a TCP connection to the host bridge.
///
/// Requests are correlated by id; host-pushed events are fanned out to
/// [`RemoteEndpoint::subscribe`] receivers. When the connection drops every
/// pending call fails with [`DISCONNECTED`] and the endpoint stops reporting
/// ready.
pub struct RemoteEndpoint {
	writer: Mutex<BufWriter<OwnedWriteHalf>>,
	pending: Arc<SyncMutex<PendingRequests>>,
	next_id: AtomicU64,
	connected: Arc<AtomicBool>,
	operations: HashSet<String>,
	events: broadcast::Sender<HostEvent>,
	reader: JoinHandle<()>,
}

impl RemoteEndpoint {
	/// Connect, authenticate if a token is configured, and load the operation list.
	pub async fn connect(options: &ConnectOptions) -> Result<Self, ConnectError> {
		let addr = options.addr();

		let stream = timeout(options.connect_timeout, TcpStream::connect(&addr))
			.await
			.map_err(|_| ConnectError::Timeout {
				addr: addr.clone(),
				timeout: options.connect_timeout,
			})?
			.map_err(|source| ConnectError::Io {
				addr: addr.clone(),
				source,
			})?;

		let (reader, writer) = stream.into_split();
		let pending: Arc<SyncMutex<PendingRequests>> = Arc::new(SyncMutex::new(HashMap::new()));
		let connected = Arc::new(AtomicBool::new(true));
		let (events, _) = broadcast::channel(EVENT_CAPACITY);

		let reader = Self::spawn_reader(
			BufReader::new(reader),
			pending.clone(),
			connected.clone(),
			events.clone(),
		);

		let mut endpoint = Self {
			writer: Mutex::new(BufWriter::new(writer)),
			pending,
			next_id: AtomicU64::new(1),
			connected,
			operations: HashSet::new(),
			events,
			reader,
		};

		if let Some(token) = options.token.as_ref() {
			let params = serde_json::to_value(AuthParams {
				token: token.expose(),
			})
			.map_err(|e| ConnectError::Handshake(e.to_string()))?;
			let result = endpoint
				.handshake_call(METHOD_AUTH, vec![params], options.connect_timeout)
				.await?;
			let auth: AuthResult = serde_json::from_value(result)
				.map_err(|e| ConnectError::Handshake(e.to_string()))?;
			if !auth.ok {
				endpoint.connected.store(false, Ordering::SeqCst);
				return Err(ConnectError::AuthFailed);
			}
		}

		let result = endpoint
			.handshake_call(METHOD_LIST_OPERATIONS, vec![], options.connect_timeout)
			.await?;
		let listed: OperationsResult =
			serde_json::from_value(result).map_err(|e| ConnectError::Handshake(e.to_string()))?;
		endpoint.operations = listed.operations.into_iter().collect();

		info!(
			%addr,
			operations = endpoint.operations.len(),
			"connected to host bridge"
		);
		Ok(endpoint)
	}

	/// Receive host-pushed events from this point on.
	pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
		self.events.subscribe()
	}

	pub fn is_connected(&self) -> bool {
		self.connected.load(Ordering::SeqCst)
	}

	/// Calls still waiting for a response.
	pub fn pending_calls(&self) -> usize {
		self.pending.lock().len()
	}

	/// Operation names advertised during the handshake.
	pub fn operations(&self) -> impl Iterator<Item = &str> {
		self.operations.iter().map(String::as_str)
	}

	async fn handshake_call(
		&self,
		method: &str,
		params: Vec<Value>,
		limit: Duration,
	) -> Result<Value, ConnectError> {
		match timeout(limit, self.request(method, params)).await {
			Ok(result) => result.map_err(ConnectError::Handshake),
			Err(_) => Err(ConnectError::Handshake(format!(
				"{method} timed out after {limit:?}"
			))),
		}
	}

	async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, String> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		{
			let mut pending = self.pending.lock();
			// The reader clears `connected` before draining under this lock.
			if !self.is_connected() {
				return Err(DISCONNECTED.to_string());
			}
			pending.insert(id, tx);
		}
		let _entry = PendingEntry {
			pending: &self.pending,
			id,
		};

		let request = Request { id, method, params };
		let mut line = match serde_json::to_string(&request) {
			Ok(line) => line,
			Err(e) => return Err(format!("request encoding failed: {e}")),
		};
		line.push('\n');

		let written = {
			let mut writer = self.writer.lock().await;
			match writer.write_all(line.as_bytes()).await {
				Ok(()) => writer.flush().await,
				Err(e) => Err(e),
			}
		};
		if let Err(e) = written {
			warn!(id, method, error = %e, "bridge write failed");
			return Err(DISCONNECTED.to_string());
		}

		rx.await.map_err(|_| DISCONNECTED.to_string())?
	}

	fn spawn_reader(
		mut reader: BufReader<OwnedReadHalf>,
		pending: Arc<SyncMutex<PendingRequests>>,
		connected: Arc<AtomicBool>,
		events: broadcast::Sender<HostEvent>,
	) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut line = String::new();
			loop {
				line.clear();
				match reader.read_line(&mut line).await {
					Ok(0) => break,
					Ok(_) => {
						let trimmed = line.trim();
						if trimmed.is_empty() {
							continue;
						}
						match serde_json::from_str::<IncomingMessage>(trimmed) {
							Ok(IncomingMessage::Success { id, result }) => {
								Self::complete(&pending, id, Ok(result));
							}
							Ok(IncomingMessage::Error { id, error }) => {
								let message = format!("{}: {}", error.code, error.message);
								Self::complete(&pending, id, Err(message));
							}
							Ok(IncomingMessage::Event { method, params }) => {
								debug!(%method, "bridge event");
								// No receivers is fine.
								let _ = events.send(HostEvent::from_wire(method, params));
							}
							Err(e) => warn!(error = %e, "ignoring malformed bridge message"),
						}
					}
					Err(e) => {
						warn!(error = %e, "bridge read failed");
						break;
					}
				}
			}

			connected.store(false, Ordering::SeqCst);
			info!("host bridge connection closed");

			let mut pending = pending.lock();
			for (_, sender) in pending.drain() {
				let _ = sender.send(Err(DISCONNECTED.to_string()));
			}
		})
	}

	fn complete(pending: &SyncMutex<PendingRequests>, id: u64, result: Result<Value, String>) {
		let sender = pending.lock().remove(&id);
		match sender {
			Some(sender) => {
				let _ = sender.send(result);
			}
			None => debug!(id, "response for unknown request id"),
		}
	}
}

/// Removes its request id from the pending map once the call settles or is dropped.
struct PendingEntry<'a> {
	pending: &'a SyncMutex<PendingRequests>,
	id: u64,
}

impl Drop for PendingEntry<'_> {
	fn drop(&mut self) {
		self.pending.lock().remove(&self.id);
	}
}

impl Drop for RemoteEndpoint {
	fn drop(&mut self) {
		self.reader.abort();
	}
}

#[async_trait]
impl Endpoint for RemoteEndpoint {
	fn is_ready(&self) -> bool {
		self.is_connected()
	}

	fn has_operation(&self, operation: &str) -> bool {
		self.operations.contains(operation)
	}

	async fn call(&self, operation: &str, args: Vec<Value>) -> Result<Value, String> {
		self.request(operation, args).await
	}
}
