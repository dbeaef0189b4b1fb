//! Transaction models as delivered on the push channel.
//!
//! These are deliberately lean: the SDK does not build or serialize
//! transactions, it only needs enough structure to route, filter, and verify
//! cosignature completeness. Unknown fields on the wire are ignored.

use serde::{Deserialize, Serialize};

use crate::models::{
	account::{Address, UnresolvedAddress},
	transaction::TransactionType,
};

/// A cosignature attached to an aggregate transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cosignature {
	pub signer_address: Address,
	/// Detached signature bytes, hex-rendered
	pub signature: String,
	#[serde(default)]
	pub version: u64,
}

/// An inner transaction of an aggregate.
///
/// Inner transactions always declare their signer; that signer is the account
/// whose (possibly multisig) approval the completion verifier checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerTransaction {
	#[serde(rename = "type")]
	pub transaction_type: TransactionType,
	pub signer_address: Address,
	#[serde(default)]
	pub recipient_address: Option<UnresolvedAddress>,
	#[serde(default)]
	pub address_additions: Vec<UnresolvedAddress>,
	#[serde(default)]
	pub address_deletions: Vec<UnresolvedAddress>,
}

impl InnerTransaction {
	/// True when this is a multisig modification that deletes cosignatories.
	///
	/// Removal operations are approved against `min_removal` instead of
	/// `min_approval`.
	pub fn is_cosignatory_removal(&self) -> bool {
		self.transaction_type == TransactionType::MultisigAccountModification
			&& !self.address_deletions.is_empty()
	}

	fn concerns(&self, address: &Address) -> bool {
		self.signer_address == *address
			|| self
				.recipient_address
				.as_ref()
				.is_some_and(|recipient| recipient.matches(address))
			|| self.address_additions.iter().any(|a| a.matches(address))
			|| self.address_deletions.iter().any(|a| a.matches(address))
	}
}

/// A transaction payload from the push channel.
///
/// Aggregate fields (`transactions`, `cosignatures`) are empty for
/// non-aggregate kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	#[serde(rename = "type")]
	pub transaction_type: TransactionType,
	#[serde(default)]
	pub signer_address: Option<Address>,
	#[serde(default)]
	pub recipient_address: Option<UnresolvedAddress>,
	/// Inner transactions, for aggregates
	#[serde(default)]
	pub transactions: Vec<InnerTransaction>,
	/// Attached cosignatures, for aggregates
	#[serde(default)]
	pub cosignatures: Vec<Cosignature>,
	#[serde(default)]
	pub address_additions: Vec<UnresolvedAddress>,
	#[serde(default)]
	pub address_deletions: Vec<UnresolvedAddress>,
}

impl Transaction {
	/// True for either aggregate kind.
	pub fn is_aggregate(&self) -> bool {
		self.transaction_type.is_aggregate()
	}

	/// True when the given address signed this transaction: as the declared
	/// signer, as an inner transaction's signer, or through an attached
	/// cosignature.
	pub fn is_signed_by(&self, address: &Address) -> bool {
		self.signer_address.as_ref() == Some(address)
			|| self
				.transactions
				.iter()
				.any(|inner| inner.signer_address == *address)
			|| self
				.cosignatures
				.iter()
				.any(|cosignature| cosignature.signer_address == *address)
	}

	/// True when the transaction concerns the given address: as a recipient
	/// or a cosignatory added or removed at the top level, or as any party
	/// (signer, recipient, modified cosignatory) of an inner transaction.
	///
	/// Alias recipients are not resolved here; an unresolved alias never
	/// matches.
	pub fn notifies(&self, address: &Address) -> bool {
		self.recipient_address
			.as_ref()
			.is_some_and(|recipient| recipient.matches(address))
			|| self.address_additions.iter().any(|a| a.matches(address))
			|| self.address_deletions.iter().any(|a| a.matches(address))
			|| self.transactions.iter().any(|inner| inner.concerns(address))
	}
}

/// Meta facts attached to a pushed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
	#[serde(default)]
	pub height: u64,
	#[serde(default)]
	pub hash: Option<String>,
	#[serde(default)]
	pub merkle_component_hash: Option<String>,
}

/// A pushed transaction together with its meta envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
	pub meta: TransactionMeta,
	pub transaction: Transaction,
}

impl TransactionInfo {
	/// The transaction hash, when the meta envelope carries one.
	pub fn hash(&self) -> Option<&str> {
		self.meta.hash.as_deref()
	}
}
