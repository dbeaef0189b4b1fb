//! Block push payloads.

use serde::{Deserialize, Serialize};

use crate::models::account::Address;

/// Meta facts attached to a pushed block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMeta {
	pub hash: String,
	#[serde(default)]
	pub generation_hash: Option<String>,
}

/// Header fields of a pushed block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
	pub height: u64,
	#[serde(default)]
	pub timestamp: u64,
	#[serde(default)]
	pub signer_address: Option<Address>,
}

/// A newly harvested block, from the block channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
	pub meta: BlockMeta,
	pub block: BlockHeader,
}

/// A finalization announcement, from the finalized-block channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedBlockInfo {
	pub finalization_epoch: u64,
	pub finalization_point: u64,
	pub height: u64,
	pub hash: String,
}
