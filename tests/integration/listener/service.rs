//! Integration tests for the push-channel listener.
//!
//! Drives the listener through the in-memory stub transport: the tests play
//! the gateway, feeding handshake and event frames, and assert on what the
//! listener sends and what the consumer streams deliver.

use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

use futures::StreamExt;
use tokio::time::timeout;
use url::Url;

use meridian_sdk::{
	models::{Address, NamespaceId, UnresolvedAddress},
	services::listener::{CloseEvent, Listener, ListenerConfig, ListenerError},
};

use crate::integration::mocks::{
	multisig_info, test_address, StaticAddressResolver, StaticMultisigRepository, StubHandle,
	StubPushChannel,
};

const UID: &str = "uid-776";

fn listener_url() -> Url {
	Url::parse("ws://localhost:3000/ws").unwrap()
}

fn stub_listener(
	resolver: StaticAddressResolver,
	multisig: StaticMultisigRepository,
) -> (
	Listener<StubPushChannel, StaticAddressResolver, StaticMultisigRepository>,
	StubHandle,
) {
	let (transport, handle) = StubPushChannel::new();
	let listener = Listener::with_transport(
		listener_url(),
		transport,
		resolver,
		multisig,
		ListenerConfig::default().with_handshake_timeout(Duration::from_secs(2)),
	);
	(listener, handle)
}

async fn open_listener(
	listener: &Listener<StubPushChannel, StaticAddressResolver, StaticMultisigRepository>,
	handle: &StubHandle,
) {
	handle.push_uid(UID);
	listener.open().await.expect("handshake");
	assert!(listener.is_open());
}

fn confirmed_frame(param: &Address, signer: &Address, hash: &str) -> String {
	serde_json::json!({
		"topic": format!("confirmedAdded/{}", param.plain()),
		"data": {
			"meta": { "height": 7, "hash": hash },
			"transaction": { "type": 0x4154, "signerAddress": signer.plain() }
		}
	})
	.to_string()
}

#[tokio::test]
async fn test_open_completes_on_uid_and_reports_correlation_id() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);

	assert!(!listener.is_open());
	open_listener(&listener, &handle).await;
	assert_eq!(listener.correlation_id().as_deref(), Some(UID));
}

#[tokio::test]
async fn test_open_rejected_when_peer_closes_during_handshake() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);

	handle.push_close(1001, "going away");
	let err = listener.open().await.unwrap_err();
	assert!(matches!(err, ListenerError::Connection(_)));
	assert!(!listener.is_open());
}

#[tokio::test]
async fn test_multisig_fanout_subscribes_every_member() {
	let watched = test_address('W');
	let m1 = test_address('B');
	let m2 = test_address('C');
	let multisig = StaticMultisigRepository::new().with_info(multisig_info(
		&watched,
		0,
		0,
		&[],
		&[&m1, &m2],
	));
	let (listener, handle) = stub_listener(StaticAddressResolver::new(), multisig);
	open_listener(&listener, &handle).await;

	let mut stream = listener
		.confirmed(&watched.clone().into(), None, true)
		.await
		.expect("subscribe");

	let mut topics = handle.subscribed_topics();
	topics.sort();
	let mut expected = vec![
		format!("confirmedAdded/{}", watched.plain()),
		format!("confirmedAdded/{}", m1.plain()),
		format!("confirmedAdded/{}", m2.plain()),
	];
	expected.sort();
	assert_eq!(topics, expected);

	// Every subscribe frame carries the session uid
	for frame in handle.sent_frames() {
		let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
		assert_eq!(value.get("uid").and_then(|v| v.as_str()), Some(UID));
	}

	// An event for a fan-out member signed by the watched address is
	// delivered; an event for a stranger address is not
	let stranger = test_address('Z');
	handle.push_frame(confirmed_frame(&stranger, &stranger, "AA01"));
	handle.push_frame(confirmed_frame(&m1, &watched, "AA02"));

	let delivered = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("one transaction");
	assert_eq!(delivered.hash(), Some("AA02"));
}

#[tokio::test]
async fn test_indirect_membership_does_not_leak_sibling_traffic() {
	let watched = test_address('W');
	let sibling = test_address('B');
	let other = test_address('O');
	let multisig = StaticMultisigRepository::new().with_info(multisig_info(
		&watched,
		0,
		0,
		&[],
		&[&sibling],
	));
	let (listener, handle) = stub_listener(StaticAddressResolver::new(), multisig);
	open_listener(&listener, &handle).await;

	let mut stream = listener
		.confirmed(&watched.clone().into(), None, true)
		.await
		.expect("subscribe");

	// On the sibling's topic, a transaction that neither is signed by nor
	// concerns the watched address must be dropped even though the sibling
	// is a subscribed member
	handle.push_frame(confirmed_frame(&sibling, &other, "BB01"));
	// Signed by the watched address: forwarded
	handle.push_frame(confirmed_frame(&sibling, &watched, "BB02"));

	let delivered = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("one transaction");
	assert_eq!(delivered.hash(), Some("BB02"));
}

#[tokio::test]
async fn test_consecutive_duplicate_hashes_collapse() {
	let watched = test_address('W');
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let mut stream = listener
		.confirmed(&watched.clone().into(), None, false)
		.await
		.expect("subscribe");

	handle.push_frame(confirmed_frame(&watched, &watched, "CC01"));
	handle.push_frame(confirmed_frame(&watched, &watched, "CC01"));
	handle.push_frame(confirmed_frame(&watched, &watched, "CC02"));

	let first = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("first transaction");
	let second = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("second transaction");
	assert_eq!(first.hash(), Some("CC01"));
	assert_eq!(second.hash(), Some("CC02"));
}

#[tokio::test]
async fn test_unknown_channel_kills_the_connection() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let mut blocks = listener.new_block().await.expect("subscribe");
	handle.push_frame(r#"{"topic": "bogus/xyz", "data": {}}"#);

	// The dispatch loop must abort: consumer streams end and the connection
	// reports closed
	let ended = timeout(Duration::from_secs(5), blocks.next())
		.await
		.expect("stream must terminate, not hang");
	assert!(ended.is_none());
	assert!(!listener.is_open());
}

#[tokio::test]
async fn test_multisig_lookup_failure_degrades_to_single_subscription() {
	let watched = test_address('W');
	// No multisig record for the watched address at all
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let _stream = listener
		.confirmed(&watched.clone().into(), None, true)
		.await
		.expect("subscribe must fall back, not fail");

	assert_eq!(
		handle.subscribed_topics(),
		vec![format!("confirmedAdded/{}", watched.plain())]
	);
}

#[tokio::test]
async fn test_alias_resolution_failure_fails_only_that_call() {
	let watched = test_address('W');
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let unresolved = UnresolvedAddress::from(NamespaceId(0xDEAD));
	let err = listener.confirmed(&unresolved, None, false).await.err().unwrap();
	assert!(matches!(err, ListenerError::Resolution(_)));

	// The shared connection survives and keeps serving other subscriptions
	assert!(listener.is_open());
	let _blocks = listener.new_block().await.expect("subscribe");
}

#[tokio::test]
async fn test_alias_subscriptions_use_the_resolved_address() {
	let concrete = test_address('R');
	let alias = NamespaceId(0x85BB_EA6C_C462_B244);
	let resolver = StaticAddressResolver::new().with_alias(alias, concrete.clone());
	let (listener, handle) = stub_listener(resolver, StaticMultisigRepository::new());
	open_listener(&listener, &handle).await;

	let _stream = listener
		.status(&alias.into(), None)
		.await
		.expect("subscribe");

	assert_eq!(
		handle.subscribed_topics(),
		vec![format!("status/{}", concrete.plain())]
	);
}

#[tokio::test]
async fn test_status_stream_filters_address_and_hash() {
	let watched = test_address('W');
	let other = test_address('O');
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let mut stream = listener
		.status(&watched.clone().into(), Some("DD02"))
		.await
		.expect("subscribe");

	let status_frame = |address: &Address, hash: &str| {
		serde_json::json!({
			"topic": format!("status/{}", address.plain()),
			"data": {
				"address": address.plain(),
				"hash": hash,
				"code": "Failure_Core_Insufficient_Balance",
				"deadline": 0
			}
		})
		.to_string()
	};
	handle.push_frame(status_frame(&other, "DD02"));
	handle.push_frame(status_frame(&watched, "DD01"));
	handle.push_frame(status_frame(&watched, "DD02"));

	let delivered = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("one status");
	assert_eq!(delivered.hash, "DD02");
	assert_eq!(delivered.code, "Failure_Core_Insufficient_Balance");
}

#[tokio::test]
async fn test_unconfirmed_removed_emits_deduplicated_hashes() {
	let watched = test_address('W');
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let mut stream = listener
		.unconfirmed_removed(&watched.clone().into(), None, false)
		.await
		.expect("subscribe");

	let removed_frame = |hash: &str| {
		serde_json::json!({
			"topic": format!("unconfirmedRemoved/{}", watched.plain()),
			"data": hash
		})
		.to_string()
	};
	handle.push_frame(removed_frame("EE01"));
	handle.push_frame(removed_frame("EE01"));
	handle.push_frame(removed_frame("EE02"));

	let first = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("first hash");
	let second = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("second hash");
	assert_eq!(first, "EE01");
	assert_eq!(second, "EE02");
}

#[tokio::test]
async fn test_cosignature_stream_filters_by_membership() {
	let watched = test_address('W');
	let other = test_address('O');
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let mut stream = listener
		.cosignature_added(&watched.clone().into(), false)
		.await
		.expect("subscribe");

	let cosignature_frame = |address: &Address, parent: &str| {
		serde_json::json!({
			"topic": format!("cosignature/{}", address.plain()),
			"data": {
				"parentHash": parent,
				"signature": "FF",
				"signerAddress": address.plain()
			}
		})
		.to_string()
	};
	handle.push_frame(cosignature_frame(&other, "FF01"));
	handle.push_frame(cosignature_frame(&watched, "FF02"));

	let delivered = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("one cosignature");
	assert_eq!(delivered.parent_hash, "FF02");
}

#[tokio::test]
async fn test_new_block_passes_every_block_through() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let mut stream = listener.new_block().await.expect("subscribe");
	assert_eq!(handle.subscribed_topics(), vec!["block".to_string()]);

	handle.push_frame(
		serde_json::json!({
			"topic": "block",
			"data": { "meta": { "hash": "B1" }, "block": { "height": 41 } }
		})
		.to_string(),
	);
	handle.push_frame(
		serde_json::json!({
			"topic": "block",
			"data": { "meta": { "hash": "B2" }, "block": { "height": 42 } }
		})
		.to_string(),
	);

	let first = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("first block");
	let second = timeout(Duration::from_secs(5), stream.next())
		.await
		.expect("stream alive")
		.expect("second block");
	assert_eq!(first.block.height, 41);
	assert_eq!(second.block.height, 42);
}

#[tokio::test]
async fn test_repeated_subscriptions_send_one_wire_subscribe() {
	let watched = test_address('W');
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	open_listener(&listener, &handle).await;

	let _first = listener
		.confirmed(&watched.clone().into(), None, false)
		.await
		.expect("subscribe");
	let _second = listener
		.confirmed(&watched.clone().into(), None, false)
		.await
		.expect("subscribe");

	assert_eq!(handle.subscribed_topics().len(), 1);
}

#[tokio::test]
async fn test_close_is_idempotent() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);

	// Never opened: close must be a quiet no-op
	listener.close().await.expect("close unopened");
	assert_eq!(handle.close_count(), 0);

	open_listener(&listener, &handle).await;
	listener.close().await.expect("first close");
	listener.close().await.expect("second close");

	assert!(!listener.is_open());
	assert_eq!(handle.close_count(), 1);
}

#[tokio::test]
async fn test_unsolicited_close_reaches_the_registered_handler() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	let observed: Arc<Mutex<Option<CloseEvent>>> = Arc::new(Mutex::new(None));
	let sink = Arc::clone(&observed);
	listener.on_unsolicited_close(move |event| {
		*sink.lock().unwrap() = Some(event);
	});

	open_listener(&listener, &handle).await;
	handle.push_close(4000, "server restart");

	let event = timeout(Duration::from_secs(5), async {
		loop {
			if let Some(event) = observed.lock().unwrap().take() {
				return event;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
	})
	.await
	.expect("handler must run");

	assert_eq!(event.code, 4000);
	assert_eq!(event.reason, "server restart");
	assert_eq!(event.correlation_id.as_deref(), Some(UID));
	assert!(!listener.is_open());
}

#[tokio::test]
async fn test_local_close_is_not_reported_as_unsolicited() {
	let (listener, handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);
	let observed: Arc<Mutex<Option<CloseEvent>>> = Arc::new(Mutex::new(None));
	let sink = Arc::clone(&observed);
	listener.on_unsolicited_close(move |event| {
		*sink.lock().unwrap() = Some(event);
	});

	open_listener(&listener, &handle).await;
	listener.close().await.expect("close");
	// Emulate the transport acknowledging the local close
	handle.push_close(1000, "bye");

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert!(observed.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_subscribing_before_open_is_rejected() {
	let watched = test_address('W');
	let (listener, _handle) = stub_listener(
		StaticAddressResolver::new(),
		StaticMultisigRepository::new(),
	);

	let err = listener
		.confirmed(&watched.into(), None, false)
		.await
		.err()
		.unwrap();
	assert!(matches!(err, ListenerError::NotOpen));
}
