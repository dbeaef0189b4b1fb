//! Push channel tags.

use std::fmt;

/// The logical channels the push gateway serves.
///
/// Each tag maps to a fixed wire topic prefix; address-scoped channels append
/// `/<address>` to the prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerChannel {
	/// New block harvested
	Block,
	/// Block finalized
	FinalizedBlock,
	/// Transaction confirmed for an address
	ConfirmedAdded,
	/// Transaction entered the unconfirmed pool for an address
	UnconfirmedAdded,
	/// Transaction left the unconfirmed pool for an address
	UnconfirmedRemoved,
	/// Bonded aggregate announced for an address
	PartialAdded,
	/// Bonded aggregate removed for an address
	PartialRemoved,
	/// Cosignature announced for an address's pending aggregate
	Cosignature,
	/// Transaction rejected for an address
	Status,
}

impl ListenerChannel {
	/// The wire topic prefix for this channel.
	pub fn wire_name(self) -> &'static str {
		match self {
			Self::Block => "block",
			Self::FinalizedBlock => "finalizedBlock",
			Self::ConfirmedAdded => "confirmedAdded",
			Self::UnconfirmedAdded => "unconfirmedAdded",
			Self::UnconfirmedRemoved => "unconfirmedRemoved",
			Self::PartialAdded => "partialAdded",
			Self::PartialRemoved => "partialRemoved",
			Self::Cosignature => "cosignature",
			Self::Status => "status",
		}
	}

	/// Parses a wire topic prefix.
	pub fn from_wire_name(name: &str) -> Option<Self> {
		match name {
			"block" => Some(Self::Block),
			"finalizedBlock" => Some(Self::FinalizedBlock),
			"confirmedAdded" => Some(Self::ConfirmedAdded),
			"unconfirmedAdded" => Some(Self::UnconfirmedAdded),
			"unconfirmedRemoved" => Some(Self::UnconfirmedRemoved),
			"partialAdded" => Some(Self::PartialAdded),
			"partialRemoved" => Some(Self::PartialRemoved),
			"cosignature" => Some(Self::Cosignature),
			"status" => Some(Self::Status),
			_ => None,
		}
	}

	/// True for channels scoped to an address parameter.
	pub fn is_address_scoped(self) -> bool {
		!matches!(self, Self::Block | Self::FinalizedBlock)
	}
}

impl fmt::Display for ListenerChannel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.wire_name())
	}
}
