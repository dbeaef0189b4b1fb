//! Push-channel transport abstraction.
//!
//! The listener speaks WebSocket in production but is written against the
//! [`PushChannel`] seam so the dispatch loop can be driven by an in-memory
//! transport in tests. A connected transport is a pair: a [`FrameSink`] for
//! outbound frames and a stream of [`WireEvent`]s for inbound traffic.

use std::{pin::Pin, time::Duration};

use async_trait::async_trait;
use futures::Stream;
use futures_util::{future, SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::services::listener::ListenerError;

/// One inbound transport event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireEvent {
	/// A complete text frame
	Frame(String),
	/// The peer closed the connection
	Closed {
		/// Transport close code; 1005 when the peer sent none
		code: u16,
		/// Close reason supplied by the peer, possibly empty
		reason: String,
	},
}

/// Stream of inbound transport events.
pub type WireEventStream = Pin<Box<dyn Stream<Item = Result<WireEvent, ListenerError>> + Send>>;

/// Outbound half of a connected push transport.
#[async_trait]
pub trait FrameSink: Send {
	/// Sends one text frame.
	async fn send(&mut self, frame: String) -> Result<(), ListenerError>;

	/// Requests an orderly transport close.
	async fn close(&mut self) -> Result<(), ListenerError>;
}

/// A transport able to open push-channel connections.
#[async_trait]
pub trait PushChannel: Send + Sync + 'static {
	/// Connects to the push endpoint.
	async fn connect(
		&self,
		url: &Url,
	) -> Result<(Box<dyn FrameSink>, WireEventStream), ListenerError>;
}

/// WebSocket production transport over `tokio-tungstenite`.
#[derive(Clone, Debug)]
pub struct WsPushChannel {
	connection_timeout: Duration,
}

impl WsPushChannel {
	pub fn new(connection_timeout: Duration) -> Self {
		Self { connection_timeout }
	}
}

impl Default for WsPushChannel {
	fn default() -> Self {
		Self::new(Duration::from_secs(10))
	}
}

#[async_trait]
impl PushChannel for WsPushChannel {
	async fn connect(
		&self,
		url: &Url,
	) -> Result<(Box<dyn FrameSink>, WireEventStream), ListenerError> {
		let (ws_stream, _) = timeout(self.connection_timeout, connect_async(url.as_str()))
			.await
			.map_err(|_| ListenerError::Connection(format!("timed out connecting to {}", url)))?
			.map_err(|e| ListenerError::Connection(e.to_string()))?;

		let (sink, stream) = ws_stream.split();

		let events: WireEventStream = stream
			.filter_map(|item| {
				future::ready(match item {
					Ok(Message::Text(text)) => Some(Ok(WireEvent::Frame(text.to_string()))),
					Ok(Message::Close(frame)) => Some(Ok(match frame {
						Some(frame) => WireEvent::Closed {
							code: frame.code.into(),
							reason: frame.reason.to_string(),
						},
						None => WireEvent::Closed {
							code: 1005,
							reason: String::new(),
						},
					})),
					// Control and binary frames carry no push events
					Ok(_) => None,
					Err(e) => Some(Err(ListenerError::Transport(e.to_string()))),
				})
			})
			.boxed();

		Ok((Box::new(WsFrameSink { sink }), events))
	}
}

struct WsFrameSink {
	sink: futures_util::stream::SplitSink<
		tokio_tungstenite::WebSocketStream<
			tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
		>,
		Message,
	>,
}

#[async_trait]
impl FrameSink for WsFrameSink {
	async fn send(&mut self, frame: String) -> Result<(), ListenerError> {
		self.sink
			.send(Message::Text(frame.into()))
			.await
			.map_err(|e| ListenerError::Transport(e.to_string()))
	}

	async fn close(&mut self) -> Result<(), ListenerError> {
		self.sink
			.close()
			.await
			.map_err(|e| ListenerError::Transport(e.to_string()))
	}
}
