// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Drives `RemoteEndpoint` against an in-process host speaking the bridge wire protocol.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flowtest_common_bridge::client::{ConnectError, DISCONNECTED};
use flowtest_common_bridge::{
	BridgeError, ConnectOptions, Dispatcher, Endpoint, HostEvent, RemoteEndpoint, SecretString,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

const TOKEN: &str = "s3cret";

/// Accepts a single connection and records every method it receives.
async fn spawn_host() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let log = seen.clone();

	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let (reader, mut writer) = stream.into_split();
		let mut lines = BufReader::new(reader).lines();

		while let Ok(Some(line)) = lines.next_line().await {
			let request: Value = serde_json::from_str(&line).unwrap();
			let id = request["id"].clone();
			let method = request["method"].as_str().unwrap().to_string();
			log.lock().unwrap().push(method.clone());

			let reply = match method.as_str() {
				"auth" => {
					let ok = request["params"][0]["token"] == TOKEN;
					json!({"id": id, "result": {"ok": ok}})
				}
				"list_operations" => json!({
					"id": id,
					"result": {"operations": ["ping", "get_screen_frame", "close_target_app", "run_stress_test"]}
				}),
				"ping" => json!({"id": id, "result": "pong"}),
				"get_screen_frame" => json!({
					"id": id,
					"error": {"code": "internal", "message": "display gone"}
				}),
				"close_target_app" => {
					let event = json!({"method": "target_exited", "params": {"pid": 7}});
					writer
						.write_all(format!("{event}\n").as_bytes())
						.await
						.unwrap();
					json!({"id": id, "result": {"success": true}})
				}
				// Hang up mid-call.
				_ => return,
			};
			writer
				.write_all(format!("{reply}\n").as_bytes())
				.await
				.unwrap();
		}
	});

	(addr, seen)
}

/// What a handshake-only host does once `list_operations` is answered.
#[derive(Clone, Copy)]
enum AfterHandshake {
	HangUp,
	Ignore,
}

async fn spawn_handshake_only_host(after: AfterHandshake) -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let (reader, mut writer) = stream.into_split();
		let mut lines = BufReader::new(reader).lines();

		let line = lines.next_line().await.unwrap().unwrap();
		let request: Value = serde_json::from_str(&line).unwrap();
		let reply = json!({"id": request["id"], "result": {"operations": ["run_stress_test"]}});
		writer
			.write_all(format!("{reply}\n").as_bytes())
			.await
			.unwrap();

		match after {
			AfterHandshake::HangUp => {}
			AfterHandshake::Ignore => while let Ok(Some(_)) = lines.next_line().await {},
		}
	});

	addr
}

fn options(addr: SocketAddr, token: Option<&str>) -> ConnectOptions {
	ConnectOptions {
		host: addr.ip().to_string(),
		port: addr.port(),
		token: token.map(SecretString::from),
		connect_timeout: Duration::from_secs(5),
	}
}

#[tokio::test]
async fn handshake_then_typed_call() {
	let (addr, seen) = spawn_host().await;
	let endpoint = RemoteEndpoint::connect(&options(addr, Some(TOKEN)))
		.await
		.unwrap();
	assert!(endpoint.is_connected());

	let dispatcher = Dispatcher::with_endpoint(Arc::new(endpoint));
	let pong: String = dispatcher.invoke("ping", vec![]).await.unwrap();
	assert_eq!(pong, "pong");

	assert_eq!(
		*seen.lock().unwrap(),
		vec!["auth", "list_operations", "ping"]
	);
}

#[tokio::test]
async fn operation_missing_from_listing_is_never_sent() {
	let (addr, seen) = spawn_host().await;
	let endpoint = RemoteEndpoint::connect(&options(addr, None)).await.unwrap();
	let dispatcher = Dispatcher::with_endpoint(Arc::new(endpoint));

	let result = dispatcher
		.invoke_raw("verify_visual_result", vec![json!("circle")])
		.await;

	assert_eq!(
		result,
		Err(BridgeError::UnknownOperation(
			"verify_visual_result".to_string()
		))
	);
	assert_eq!(*seen.lock().unwrap(), vec!["list_operations"]);
}

#[tokio::test]
async fn wrong_token_fails_auth() {
	let (addr, _) = spawn_host().await;
	let result = RemoteEndpoint::connect(&options(addr, Some("nope"))).await;
	assert!(matches!(result, Err(ConnectError::AuthFailed)));
}

#[tokio::test]
async fn rpc_error_becomes_remote_rejection() {
	let (addr, _) = spawn_host().await;
	let endpoint = RemoteEndpoint::connect(&options(addr, None)).await.unwrap();
	let dispatcher = Dispatcher::with_endpoint(Arc::new(endpoint));

	let result = dispatcher.invoke_raw("get_screen_frame", vec![]).await;
	assert_eq!(
		result,
		Err(BridgeError::RemoteRejected(
			"internal: display gone".to_string()
		))
	);
}

#[tokio::test]
async fn host_events_reach_subscribers() {
	let (addr, _) = spawn_host().await;
	let endpoint = RemoteEndpoint::connect(&options(addr, None)).await.unwrap();
	let mut events = endpoint.subscribe();
	let dispatcher = Dispatcher::with_endpoint(Arc::new(endpoint));

	let closed = dispatcher
		.invoke_raw("close_target_app", vec![])
		.await
		.unwrap();
	assert_eq!(closed, json!({"success": true}));

	let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
		.await
		.unwrap()
		.unwrap();
	assert_eq!(
		event,
		HostEvent::TargetExited {
			pid: Some(7),
			exit_code: None
		}
	);
}

#[tokio::test]
async fn hang_up_fails_pending_call_and_endpoint_goes_unready() {
	let (addr, _) = spawn_host().await;
	let endpoint = RemoteEndpoint::connect(&options(addr, None)).await.unwrap();
	let dispatcher = Dispatcher::with_endpoint(Arc::new(endpoint));

	let result = dispatcher
		.invoke_raw("run_stress_test", vec![json!(10)])
		.await;
	assert_eq!(
		result,
		Err(BridgeError::RemoteRejected(DISCONNECTED.to_string()))
	);

	// The reader marks the endpoint disconnected before failing pending calls.
	assert!(!dispatcher.is_ready().await);
	assert_eq!(
		dispatcher.invoke_raw("ping", vec![]).await,
		Err(BridgeError::EndpointNotReady)
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn calls_racing_a_hang_up_always_settle() {
	for _ in 0..50 {
		let addr = spawn_handshake_only_host(AfterHandshake::HangUp).await;
		let endpoint = RemoteEndpoint::connect(&options(addr, None)).await.unwrap();

		let result = tokio::time::timeout(
			Duration::from_secs(5),
			endpoint.call("run_stress_test", vec![json!(1)]),
		)
		.await
		.expect("call to settle once the host hangs up");
		assert_eq!(result, Err(DISCONNECTED.to_string()));
		assert_eq!(endpoint.pending_calls(), 0);
	}
}

#[tokio::test]
async fn timed_out_call_releases_its_pending_slot() {
	let addr = spawn_handshake_only_host(AfterHandshake::Ignore).await;
	let endpoint = Arc::new(RemoteEndpoint::connect(&options(addr, None)).await.unwrap());
	let dispatcher = Dispatcher::with_endpoint(endpoint.clone())
		.with_call_timeout(Some(Duration::from_millis(50)));

	for _ in 0..3 {
		let result = dispatcher.invoke_raw("run_stress_test", vec![json!(1)]).await;
		assert_eq!(result, Err(BridgeError::Timeout(Duration::from_millis(50))));
	}
	assert!(endpoint.is_connected());
	assert_eq!(endpoint.pending_calls(), 0);
}
