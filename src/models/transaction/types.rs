//! Transaction type tags.

use serde::{Deserialize, Serialize};

/// Wire tag identifying a transaction's kind.
///
/// Only the kinds the SDK inspects are named; everything else round-trips
/// through [`TransactionType::Other`] untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum TransactionType {
	/// Simple value transfer
	Transfer,
	/// Aggregate carrying all required cosignatures
	AggregateComplete,
	/// Aggregate announced bonded, awaiting cosignatures
	AggregateBonded,
	/// Modification of a multisig account's cosignatory set
	MultisigAccountModification,
	/// Any transaction kind the SDK does not inspect
	Other(u16),
}

impl TransactionType {
	const TRANSFER: u16 = 0x4154;
	const AGGREGATE_COMPLETE: u16 = 0x4141;
	const AGGREGATE_BONDED: u16 = 0x4241;
	const MULTISIG_ACCOUNT_MODIFICATION: u16 = 0x4155;

	/// True for either aggregate kind.
	pub fn is_aggregate(self) -> bool {
		matches!(self, Self::AggregateComplete | Self::AggregateBonded)
	}
}

impl From<u16> for TransactionType {
	fn from(value: u16) -> Self {
		match value {
			Self::TRANSFER => Self::Transfer,
			Self::AGGREGATE_COMPLETE => Self::AggregateComplete,
			Self::AGGREGATE_BONDED => Self::AggregateBonded,
			Self::MULTISIG_ACCOUNT_MODIFICATION => Self::MultisigAccountModification,
			other => Self::Other(other),
		}
	}
}

impl From<TransactionType> for u16 {
	fn from(value: TransactionType) -> Self {
		match value {
			TransactionType::Transfer => TransactionType::TRANSFER,
			TransactionType::AggregateComplete => TransactionType::AGGREGATE_COMPLETE,
			TransactionType::AggregateBonded => TransactionType::AGGREGATE_BONDED,
			TransactionType::MultisigAccountModification => {
				TransactionType::MULTISIG_ACCOUNT_MODIFICATION
			}
			TransactionType::Other(other) => other,
		}
	}
}
