//! Listener error types.

use thiserror::Error;

use crate::repositories::RepositoryError;

/// Errors that can occur on the push channel
#[derive(Debug, Error)]
pub enum ListenerError {
	/// The transport connection could not be established
	#[error("connection failed: {0}")]
	Connection(String),

	/// The connection was established but the server never sent its
	/// correlation identifier
	#[error("handshake failed: {0}")]
	Handshake(String),

	/// An operation requires an open connection
	#[error("listener is not open")]
	NotOpen,

	/// The transport failed mid-session
	#[error("transport failure: {0}")]
	Transport(String),

	/// An inbound frame named a channel this client does not know.
	///
	/// This indicates client/server protocol skew and is fatal to the
	/// dispatch loop.
	#[error("unrecognized push channel `{0}`")]
	UnknownChannel(String),

	/// An inbound frame could not be decoded
	#[error("malformed frame: {0}")]
	MalformedFrame(String),

	/// A subscription address could not be resolved
	#[error("address resolution failed: {0}")]
	Resolution(#[from] RepositoryError),
}

impl ListenerError {
	/// True for errors that must terminate the dispatch loop.
	pub fn is_fatal_protocol_error(&self) -> bool {
		matches!(self, Self::UnknownChannel(_) | Self::MalformedFrame(_))
	}
}

/// Details of a transport-level close that was not requested locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseEvent {
	/// The correlation identifier of the session, when the handshake had
	/// completed
	pub correlation_id: Option<String>,
	/// Transport close code
	pub code: u16,
	/// Human-readable close reason
	pub reason: String,
}
