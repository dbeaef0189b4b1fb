//! The push-channel listener.
//!
//! One `Listener` owns one physical push connection and multiplexes any
//! number of logical subscriptions over it. Callers obtain typed streams of
//! ledger events for an address; the listener resolves aliases, expands a
//! subscription across the multisig accounts the address cosigns for, and
//! demultiplexes inbound traffic so that each consumer only sees events that
//! belong to its subscription.
//!
//! Inbound frames are parsed once on a dedicated dispatch task and published
//! on a shared broadcast stream; every consumer owns an independent
//! filter/dedupe pipeline over that stream, so a slow consumer never blocks
//! dispatch or its siblings. The listener never reconnects on its own: an
//! unsolicited transport close is reported and the connection stays down
//! until `open()` is called again.

use std::{
	collections::HashSet,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, Mutex, MutexGuard,
	},
};

use futures::{future, stream::BoxStream, Stream, StreamExt};
use tokio::{
	sync::{broadcast, oneshot},
	time::timeout,
};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use url::Url;

use crate::{
	models::{
		Address, BlockInfo, CosignatureSignedTransaction, FinalizedBlockInfo, TransactionInfo,
		TransactionStatusError, UnresolvedAddress,
	},
	repositories::{AddressResolver, MultisigRepository},
	services::listener::{
		connection::ConnectionState,
		message::{InboundFrame, ListenerMessage, ListenerPayload},
		transport::{FrameSink, PushChannel, WireEvent, WireEventStream, WsPushChannel},
		CloseEvent, ListenerChannel, ListenerConfig, ListenerError,
	},
};

type CloseHandler = Box<dyn Fn(CloseEvent) + Send + Sync>;

/// Connection state shared between the listener handle and its dispatch task.
struct ListenerShared {
	state: Mutex<ConnectionState>,
	sink: tokio::sync::Mutex<Option<Box<dyn FrameSink>>>,
	/// Multicast sender for parsed events; present only while a connection
	/// exists. Dropping it terminates every consumer stream.
	messages: Mutex<Option<broadcast::Sender<ListenerMessage>>>,
	/// Wire topics already subscribed on the current connection
	sent_topics: Mutex<HashSet<String>>,
	/// Set before a locally-requested close so the resulting transport close
	/// is not reported as unsolicited
	locally_closed: AtomicBool,
	on_unsolicited_close: Mutex<Option<CloseHandler>>,
}

/// Locks a mutex, recovering the data from a poisoned lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Client for the gateway's push channel.
///
/// Generic over the transport and the two repositories it consumes so tests
/// can drive it without a network. Production code uses the
/// [`WsPushChannel`] transport via [`Listener::new`].
pub struct Listener<C, R, M> {
	url: Url,
	transport: C,
	resolver: R,
	multisig: M,
	config: ListenerConfig,
	shared: Arc<ListenerShared>,
	/// Serializes concurrent `open()` calls
	open_guard: tokio::sync::Mutex<()>,
}

impl<R, M> Listener<WsPushChannel, R, M>
where
	R: AddressResolver,
	M: MultisigRepository,
{
	/// Creates a WebSocket-backed listener with default configuration.
	pub fn new(url: Url, resolver: R, multisig: M) -> Self {
		Self::with_config(url, resolver, multisig, ListenerConfig::default())
	}

	/// Creates a WebSocket-backed listener with the given configuration.
	pub fn with_config(url: Url, resolver: R, multisig: M, config: ListenerConfig) -> Self {
		let transport = WsPushChannel::new(config.connection_timeout);
		Self::with_transport(url, transport, resolver, multisig, config)
	}
}

impl<C, R, M> Listener<C, R, M>
where
	C: PushChannel,
	R: AddressResolver,
	M: MultisigRepository,
{
	/// Creates a listener over a caller-supplied transport.
	pub fn with_transport(
		url: Url,
		transport: C,
		resolver: R,
		multisig: M,
		config: ListenerConfig,
	) -> Self {
		Self {
			url,
			transport,
			resolver,
			multisig,
			config,
			shared: Arc::new(ListenerShared {
				state: Mutex::new(ConnectionState::Closed),
				sink: tokio::sync::Mutex::new(None),
				messages: Mutex::new(None),
				sent_topics: Mutex::new(HashSet::new()),
				locally_closed: AtomicBool::new(false),
				on_unsolicited_close: Mutex::new(None),
			}),
			open_guard: tokio::sync::Mutex::new(()),
		}
	}

	/// Registers a handler for transport closes the listener did not request.
	///
	/// Without a handler, an unsolicited close is logged at error level. A
	/// close requested through [`Listener::close`] is never reported.
	pub fn on_unsolicited_close<F>(&self, handler: F)
	where
		F: Fn(CloseEvent) + Send + Sync + 'static,
	{
		*lock(&self.shared.on_unsolicited_close) = Some(Box::new(handler));
	}

	/// Opens the push connection and completes the server handshake.
	///
	/// A no-op when a connection already exists. The returned future resolves
	/// once the server has assigned this session its correlation identifier;
	/// a transport failure before that point rejects it.
	pub async fn open(&self) -> Result<(), ListenerError> {
		let _guard = self.open_guard.lock().await;
		if lock(&self.shared.state).is_active() {
			return Ok(());
		}

		*lock(&self.shared.state) = ConnectionState::Connecting;
		self.shared.locally_closed.store(false, Ordering::SeqCst);

		let (sink, events) = match self.transport.connect(&self.url).await {
			Ok(connected) => connected,
			Err(e) => {
				*lock(&self.shared.state) = ConnectionState::Closed;
				return Err(e);
			}
		};

		*self.shared.sink.lock().await = Some(sink);
		*lock(&self.shared.messages) =
			Some(broadcast::channel(self.config.multicast_capacity).0);
		*lock(&self.shared.state) = ConnectionState::Handshaking;

		let (handshake_tx, handshake_rx) = oneshot::channel();
		tokio::spawn(dispatch(Arc::clone(&self.shared), events, handshake_tx));

		match timeout(self.config.handshake_timeout, handshake_rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(ListenerError::Handshake(
				"dispatch task ended before the handshake".to_string(),
			)),
			Err(_) => {
				self.shared.locally_closed.store(true, Ordering::SeqCst);
				teardown(&self.shared).await;
				Err(ListenerError::Handshake(
					"timed out waiting for the server correlation identifier".to_string(),
				))
			}
		}
	}

	/// Closes the push connection and every subscription on it.
	///
	/// Idempotent: closing a listener that is already closed, or was never
	/// opened, does nothing.
	pub async fn close(&self) -> Result<(), ListenerError> {
		if !lock(&self.shared.state).is_active() {
			return Ok(());
		}
		self.shared.locally_closed.store(true, Ordering::SeqCst);
		teardown(&self.shared).await;
		Ok(())
	}

	/// True while the handshake has completed and the transport is up.
	pub fn is_open(&self) -> bool {
		lock(&self.shared.state).is_open()
	}

	/// The correlation identifier of the current session, once open.
	pub fn correlation_id(&self) -> Option<String> {
		lock(&self.shared.state).uid().map(str::to_string)
	}

	/// Streams every newly harvested block.
	pub async fn new_block(&self) -> Result<BoxStream<'static, BlockInfo>, ListenerError> {
		self.subscribe_topic(ListenerChannel::Block.wire_name().to_string())
			.await?;
		let stream = self.message_stream()?;
		Ok(stream
			.filter_map(|message| {
				future::ready(match message.payload {
					ListenerPayload::Block(block) => Some(block),
					_ => None,
				})
			})
			.boxed())
	}

	/// Streams every block finalization announcement.
	pub async fn finalized_block(
		&self,
	) -> Result<BoxStream<'static, FinalizedBlockInfo>, ListenerError> {
		self.subscribe_topic(ListenerChannel::FinalizedBlock.wire_name().to_string())
			.await?;
		let stream = self.message_stream()?;
		Ok(stream
			.filter_map(|message| {
				future::ready(match message.payload {
					ListenerPayload::FinalizedBlock(block) => Some(block),
					_ => None,
				})
			})
			.boxed())
	}

	/// Streams transactions confirmed for the given address.
	///
	/// # Arguments
	/// * `address` - The address (or alias) to watch
	/// * `transaction_hash` - When given, only that transaction is forwarded
	/// * `expand_multisig` - Also watch every multisig account the address
	///   cosigns for
	pub async fn confirmed(
		&self,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, TransactionInfo>, ListenerError> {
		self.transaction_stream(
			ListenerChannel::ConfirmedAdded,
			address,
			transaction_hash,
			expand_multisig,
		)
		.await
	}

	/// Streams transactions entering the unconfirmed pool for the given
	/// address. Same filtering contract as [`Listener::confirmed`].
	pub async fn unconfirmed_added(
		&self,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, TransactionInfo>, ListenerError> {
		self.transaction_stream(
			ListenerChannel::UnconfirmedAdded,
			address,
			transaction_hash,
			expand_multisig,
		)
		.await
	}

	/// Streams bonded aggregates announced for the given address. Same
	/// filtering contract as [`Listener::confirmed`].
	pub async fn aggregate_bonded_added(
		&self,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, TransactionInfo>, ListenerError> {
		self.transaction_stream(
			ListenerChannel::PartialAdded,
			address,
			transaction_hash,
			expand_multisig,
		)
		.await
	}

	/// Streams hashes of transactions leaving the unconfirmed pool for the
	/// given address.
	pub async fn unconfirmed_removed(
		&self,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, String>, ListenerError> {
		self.removed_hash_stream(
			ListenerChannel::UnconfirmedRemoved,
			address,
			transaction_hash,
			expand_multisig,
		)
		.await
	}

	/// Streams hashes of bonded aggregates removed for the given address.
	pub async fn aggregate_bonded_removed(
		&self,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, String>, ListenerError> {
		self.removed_hash_stream(
			ListenerChannel::PartialRemoved,
			address,
			transaction_hash,
			expand_multisig,
		)
		.await
	}

	/// Streams status errors for the given address.
	///
	/// Status subscriptions are never multisig-expanded; the stream carries
	/// exactly the watched address's rejections.
	pub async fn status(
		&self,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
	) -> Result<BoxStream<'static, TransactionStatusError>, ListenerError> {
		let resolved = self.resolver.resolve(address).await?;
		self.subscribe_topic(format!(
			"{}/{}",
			ListenerChannel::Status.wire_name(),
			resolved.plain()
		))
		.await?;

		let watched = resolved.plain().to_string();
		let hash_filter = transaction_hash.map(str::to_ascii_uppercase);
		let stream = self.message_stream()?;
		Ok(stream
			.filter_map(move |message| {
				future::ready(filter_status(message, &watched, hash_filter.as_deref()))
			})
			.boxed())
	}

	/// Streams cosignatures announced for the given address's pending
	/// aggregates.
	pub async fn cosignature_added(
		&self,
		address: &UnresolvedAddress,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, CosignatureSignedTransaction>, ListenerError> {
		let resolved = self.resolver.resolve(address).await?;
		let members = self
			.subscribe_members(&resolved, ListenerChannel::Cosignature, expand_multisig)
			.await?;
		let stream = self.message_stream()?;
		Ok(stream
			.filter_map(move |message| future::ready(filter_cosignature(message, &members)))
			.boxed())
	}

	/// Resolves an address and subscribes it on a channel, optionally fanning
	/// out across its multisig memberships.
	///
	/// Returns the subscribed member set as normalized address strings; an
	/// inbound event belongs to this subscription when its topic parameter
	/// matches any member, compared case-insensitively.
	pub async fn subscribe_with_multisig(
		&self,
		address: &UnresolvedAddress,
		channel: ListenerChannel,
		expand_multisig: bool,
	) -> Result<HashSet<String>, ListenerError> {
		let resolved = self.resolver.resolve(address).await?;
		self.subscribe_members(&resolved, channel, expand_multisig)
			.await
	}

	async fn transaction_stream(
		&self,
		channel: ListenerChannel,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, TransactionInfo>, ListenerError> {
		let requested = self.resolver.resolve(address).await?;
		let members = self
			.subscribe_members(&requested, channel, expand_multisig)
			.await?;

		let hash_filter = transaction_hash.map(str::to_ascii_uppercase);
		let stream = self.message_stream()?;
		let mut last_hash: Option<String> = None;
		Ok(stream
			.filter_map(move |message| {
				future::ready(filter_transaction(
					message,
					channel,
					&members,
					&requested,
					hash_filter.as_deref(),
					&mut last_hash,
				))
			})
			.boxed())
	}

	async fn removed_hash_stream(
		&self,
		channel: ListenerChannel,
		address: &UnresolvedAddress,
		transaction_hash: Option<&str>,
		expand_multisig: bool,
	) -> Result<BoxStream<'static, String>, ListenerError> {
		let requested = self.resolver.resolve(address).await?;
		let members = self
			.subscribe_members(&requested, channel, expand_multisig)
			.await?;

		let hash_filter = transaction_hash.map(str::to_ascii_uppercase);
		let stream = self.message_stream()?;
		let mut last_hash: Option<String> = None;
		Ok(stream
			.filter_map(move |message| {
				future::ready(filter_removed_hash(
					message,
					channel,
					&members,
					hash_filter.as_deref(),
					&mut last_hash,
				))
			})
			.boxed())
	}

	/// Subscribes a resolved address on a channel, expanding across its
	/// multisig memberships when requested.
	///
	/// A failed multisig lookup degrades to a plain single-address
	/// subscription; the address may simply not be a multisig party, so the
	/// failure is recoverable by contract.
	async fn subscribe_members(
		&self,
		address: &Address,
		channel: ListenerChannel,
		expand_multisig: bool,
	) -> Result<HashSet<String>, ListenerError> {
		let mut members = vec![address.clone()];
		if expand_multisig {
			match self.multisig.multisig_account_info(address).await {
				Ok(info) => members.extend(info.multisig_addresses),
				Err(e) => {
					tracing::debug!(
						address = %address,
						error = %e,
						"multisig expansion unavailable, subscribing the plain address"
					);
				}
			}
		}

		for member in &members {
			self.subscribe_topic(format!("{}/{}", channel.wire_name(), member.plain()))
				.await?;
		}
		Ok(members
			.into_iter()
			.map(|member| member.plain().to_string())
			.collect())
	}

	/// Sends one wire subscribe, at most once per topic per connection.
	async fn subscribe_topic(&self, topic: String) -> Result<(), ListenerError> {
		let uid = lock(&self.shared.state)
			.uid()
			.map(str::to_string)
			.ok_or(ListenerError::NotOpen)?;
		if !lock(&self.shared.sent_topics).insert(topic.clone()) {
			return Ok(());
		}

		let frame = serde_json::json!({ "uid": uid, "subscribe": topic }).to_string();
		let mut sink = self.shared.sink.lock().await;
		let sink = sink.as_mut().ok_or(ListenerError::NotOpen)?;
		if let Err(e) = sink.send(frame).await {
			lock(&self.shared.sent_topics).remove(&topic);
			return Err(e);
		}
		Ok(())
	}

	/// A fresh consumer view of the shared multicast stream.
	fn message_stream(
		&self,
	) -> Result<impl Stream<Item = ListenerMessage> + Send + 'static, ListenerError> {
		let receiver = lock(&self.shared.messages)
			.as_ref()
			.ok_or(ListenerError::NotOpen)?
			.subscribe();
		Ok(BroadcastStream::new(receiver).filter_map(|item| {
			future::ready(match item {
				Ok(message) => Some(message),
				Err(BroadcastStreamRecvError::Lagged(skipped)) => {
					tracing::warn!(skipped, "listener consumer lagged behind the push stream");
					None
				}
			})
		}))
	}
}

/// Per-message filter for the transaction channels.
///
/// Membership is checked case-insensitively against the subscribed member
/// set. When the event arrived for a fan-out member other than the requested
/// address, the transaction must be signed by, or concern, the requested
/// address itself; this keeps unrelated traffic of multisig siblings out of
/// the stream. Consecutive duplicates (same hash back to back) are dropped.
fn filter_transaction(
	message: ListenerMessage,
	channel: ListenerChannel,
	members: &HashSet<String>,
	requested: &Address,
	hash_filter: Option<&str>,
	last_hash: &mut Option<String>,
) -> Option<TransactionInfo> {
	if message.channel != channel {
		return None;
	}
	let param = message.param.as_deref()?.to_ascii_uppercase();
	let tx = message.payload.into_transaction()?;
	if !members.contains(&param) {
		return None;
	}
	if param != requested.plain()
		&& !tx.transaction.is_signed_by(requested)
		&& !tx.transaction.notifies(requested)
	{
		return None;
	}
	if let Some(expected) = hash_filter {
		if !tx
			.hash()
			.is_some_and(|hash| hash.eq_ignore_ascii_case(expected))
		{
			return None;
		}
	}
	if let Some(hash) = tx.hash() {
		if last_hash
			.as_deref()
			.is_some_and(|previous| previous.eq_ignore_ascii_case(hash))
		{
			return None;
		}
		*last_hash = Some(hash.to_string());
	}
	Some(tx)
}

/// Per-message filter for the removal channels; the payload is a bare hash.
fn filter_removed_hash(
	message: ListenerMessage,
	channel: ListenerChannel,
	members: &HashSet<String>,
	hash_filter: Option<&str>,
	last_hash: &mut Option<String>,
) -> Option<String> {
	if message.channel != channel {
		return None;
	}
	let param = message.param.as_deref()?.to_ascii_uppercase();
	if !members.contains(&param) {
		return None;
	}
	let hash = message.payload.into_removed_hash()?;
	if let Some(expected) = hash_filter {
		if !hash.eq_ignore_ascii_case(expected) {
			return None;
		}
	}
	if last_hash
		.as_deref()
		.is_some_and(|previous| previous.eq_ignore_ascii_case(&hash))
	{
		return None;
	}
	*last_hash = Some(hash.clone());
	Some(hash)
}

/// Per-message filter for the status channel; exact address match only.
fn filter_status(
	message: ListenerMessage,
	watched: &str,
	hash_filter: Option<&str>,
) -> Option<TransactionStatusError> {
	if message.channel != ListenerChannel::Status {
		return None;
	}
	if !message.param.as_deref()?.eq_ignore_ascii_case(watched) {
		return None;
	}
	let ListenerPayload::Status(status) = message.payload else {
		return None;
	};
	if let Some(expected) = hash_filter {
		if !status.hash.eq_ignore_ascii_case(expected) {
			return None;
		}
	}
	Some(status)
}

/// Per-message filter for the cosignature channel.
fn filter_cosignature(
	message: ListenerMessage,
	members: &HashSet<String>,
) -> Option<CosignatureSignedTransaction> {
	if message.channel != ListenerChannel::Cosignature {
		return None;
	}
	let param = message.param.as_deref()?.to_ascii_uppercase();
	if !members.contains(&param) {
		return None;
	}
	match message.payload {
		ListenerPayload::Cosignature(cosignature) => Some(cosignature),
		_ => None,
	}
}

/// Tears the connection down: closes the transport, drops the multicast
/// sender (ending every consumer stream), and forgets the subscriptions.
/// Safe to call more than once.
async fn teardown(shared: &ListenerShared) {
	*lock(&shared.state) = ConnectionState::Closed;
	lock(&shared.messages).take();
	lock(&shared.sent_topics).clear();
	if let Some(mut sink) = shared.sink.lock().await.take() {
		let _ = sink.close().await;
	}
}

/// Handles the end of a connection observed by the dispatch task.
async fn handle_close(
	shared: &ListenerShared,
	handshake: &mut Option<oneshot::Sender<Result<(), ListenerError>>>,
	code: u16,
	reason: String,
) {
	let correlation_id = lock(&shared.state).uid().map(str::to_string);
	let local = shared.locally_closed.load(Ordering::SeqCst);
	teardown(shared).await;

	if let Some(tx) = handshake.take() {
		let _ = tx.send(Err(ListenerError::Connection(format!(
			"connection closed during handshake: {} (code {})",
			reason, code
		))));
	}

	if local {
		tracing::debug!(code, "push channel closed locally");
		return;
	}

	let event = CloseEvent {
		correlation_id,
		code,
		reason,
	};
	let handlers = lock(&shared.on_unsolicited_close);
	match handlers.as_ref() {
		Some(handler) => handler(event),
		None => {
			tracing::error!(
				code = event.code,
				reason = %event.reason,
				"push channel closed unexpectedly"
			);
		}
	}
}

/// Reads the transport until it ends, parsing frames and publishing events.
///
/// The first inbound frame is expected to be the server handshake; its
/// receipt opens the session and resolves the pending `open()` call. A frame
/// that fails to parse is a protocol error and terminates the connection;
/// per-subscription concerns never reach this loop.
async fn dispatch(
	shared: Arc<ListenerShared>,
	mut events: WireEventStream,
	handshake: oneshot::Sender<Result<(), ListenerError>>,
) {
	let mut handshake = Some(handshake);
	loop {
		match events.next().await {
			Some(Ok(WireEvent::Frame(raw))) => match InboundFrame::parse(&raw) {
				Ok(InboundFrame::Handshake { uid }) => {
					tracing::debug!(uid = %uid, "push channel session established");
					*lock(&shared.state) = ConnectionState::Open { uid };
					if let Some(tx) = handshake.take() {
						let _ = tx.send(Ok(()));
					}
				}
				Ok(InboundFrame::Event(message)) => {
					let sender = lock(&shared.messages).clone();
					if let Some(sender) = sender {
						// A send error only means no consumer is currently
						// subscribed
						let _ = sender.send(message);
					}
				}
				Err(e) => {
					tracing::error!(
						error = %e,
						"fatal protocol error on push channel, dropping the connection"
					);
					teardown(&shared).await;
					if let Some(tx) = handshake.take() {
						let _ = tx.send(Err(e));
					}
					break;
				}
			},
			Some(Ok(WireEvent::Closed { code, reason })) => {
				handle_close(&shared, &mut handshake, code, reason).await;
				break;
			}
			Some(Err(e)) => {
				tracing::warn!(error = %e, "push channel transport failure");
				handle_close(&shared, &mut handshake, 1006, e.to_string()).await;
				break;
			}
			None => {
				handle_close(
					&shared,
					&mut handshake,
					1006,
					"transport stream ended".to_string(),
				)
				.await;
				break;
			}
		}
	}
}
