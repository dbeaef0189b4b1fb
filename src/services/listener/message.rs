//! Inbound frame parsing and the typed message envelope.
//!
//! Every inbound frame is JSON. The first frame of a session is the handshake
//! `{"uid": ...}`; every later frame is an event
//! `{"topic": "<channel>[/<param>]", "data": <payload>}` whose payload shape
//! is fixed by the channel. Parsing produces the tagged [`ListenerMessage`]
//! envelope published on the shared multicast stream.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
	models::{
		BlockInfo, CosignatureSignedTransaction, FinalizedBlockInfo, TransactionInfo,
		TransactionStatusError,
	},
	services::listener::{ListenerChannel, ListenerError},
};

/// Typed payload of one push event, keyed by channel.
#[derive(Clone, Debug)]
pub enum ListenerPayload {
	/// `block`
	Block(BlockInfo),
	/// `finalizedBlock`
	FinalizedBlock(FinalizedBlockInfo),
	/// `confirmedAdded`
	ConfirmedAdded(TransactionInfo),
	/// `unconfirmedAdded`
	UnconfirmedAdded(TransactionInfo),
	/// `partialAdded`
	PartialAdded(TransactionInfo),
	/// `unconfirmedRemoved`, carrying the removed transaction's hash
	UnconfirmedRemoved(String),
	/// `partialRemoved`, carrying the removed transaction's hash
	PartialRemoved(String),
	/// `cosignature`
	Cosignature(CosignatureSignedTransaction),
	/// `status`
	Status(TransactionStatusError),
}

impl ListenerPayload {
	/// The transaction payload, for the three transaction channels.
	pub fn into_transaction(self) -> Option<TransactionInfo> {
		match self {
			Self::ConfirmedAdded(tx) | Self::UnconfirmedAdded(tx) | Self::PartialAdded(tx) => {
				Some(tx)
			}
			_ => None,
		}
	}

	/// The removed-transaction hash, for the two removal channels.
	pub fn into_removed_hash(self) -> Option<String> {
		match self {
			Self::UnconfirmedRemoved(hash) | Self::PartialRemoved(hash) => Some(hash),
			_ => None,
		}
	}
}

/// One parsed push event as published on the multicast stream.
#[derive(Clone, Debug)]
pub struct ListenerMessage {
	/// The channel the event arrived on
	pub channel: ListenerChannel,
	/// The topic parameter (the subscribed address), when present
	pub param: Option<String>,
	/// The typed payload
	pub payload: ListenerPayload,
}

/// A decoded inbound frame.
#[derive(Clone, Debug)]
pub enum InboundFrame {
	/// The session handshake carrying the correlation identifier
	Handshake { uid: String },
	/// A push event
	Event(ListenerMessage),
}

impl InboundFrame {
	/// Parses one raw frame.
	///
	/// # Errors
	/// * [`ListenerError::MalformedFrame`] - the frame is not JSON, or its
	///   payload does not decode for the channel
	/// * [`ListenerError::UnknownChannel`] - the topic names a channel this
	///   client does not know; the dispatch loop treats this as fatal
	pub fn parse(raw: &str) -> Result<Self, ListenerError> {
		let value: Value = serde_json::from_str(raw)
			.map_err(|e| ListenerError::MalformedFrame(format!("invalid JSON: {}", e)))?;

		if let Some(uid) = value.get("uid").and_then(Value::as_str) {
			return Ok(Self::Handshake {
				uid: uid.to_string(),
			});
		}

		let topic = value
			.get("topic")
			.and_then(Value::as_str)
			.ok_or_else(|| ListenerError::MalformedFrame("frame has no topic".to_string()))?;
		let (name, param) = match topic.split_once('/') {
			Some((name, param)) => (name, Some(param.to_string())),
			None => (topic, None),
		};
		let channel = ListenerChannel::from_wire_name(name)
			.ok_or_else(|| ListenerError::UnknownChannel(name.to_string()))?;

		let data = value.get("data").cloned().unwrap_or(Value::Null);
		let payload = match channel {
			ListenerChannel::Block => ListenerPayload::Block(decode(channel, data)?),
			ListenerChannel::FinalizedBlock => {
				ListenerPayload::FinalizedBlock(decode(channel, data)?)
			}
			ListenerChannel::ConfirmedAdded => {
				ListenerPayload::ConfirmedAdded(decode(channel, data)?)
			}
			ListenerChannel::UnconfirmedAdded => {
				ListenerPayload::UnconfirmedAdded(decode(channel, data)?)
			}
			ListenerChannel::PartialAdded => ListenerPayload::PartialAdded(decode(channel, data)?),
			ListenerChannel::UnconfirmedRemoved => {
				ListenerPayload::UnconfirmedRemoved(decode(channel, data)?)
			}
			ListenerChannel::PartialRemoved => {
				ListenerPayload::PartialRemoved(decode(channel, data)?)
			}
			ListenerChannel::Cosignature => ListenerPayload::Cosignature(decode(channel, data)?),
			ListenerChannel::Status => ListenerPayload::Status(decode(channel, data)?),
		};

		Ok(Self::Event(ListenerMessage {
			channel,
			param,
			payload,
		}))
	}
}

fn decode<T: DeserializeOwned>(channel: ListenerChannel, data: Value) -> Result<T, ListenerError> {
	serde_json::from_value(data).map_err(|e| {
		ListenerError::MalformedFrame(format!("bad payload on channel `{}`: {}", channel, e))
	})
}
