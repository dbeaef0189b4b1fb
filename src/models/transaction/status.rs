//! Status and cosignature push payloads.

use serde::{Deserialize, Serialize};

use crate::models::account::Address;

/// A rejected or otherwise flagged transaction, from the status channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusError {
	#[serde(default)]
	pub address: Option<Address>,
	pub hash: String,
	/// Gateway status code, e.g. `Failure_Core_Insufficient_Balance`
	pub code: String,
	#[serde(default)]
	pub deadline: u64,
}

/// A cosignature announced for a pending aggregate, from the cosignature
/// channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosignatureSignedTransaction {
	/// Hash of the aggregate the cosignature applies to
	pub parent_hash: String,
	pub signature: String,
	pub signer_address: Address,
	#[serde(default)]
	pub version: u64,
}
